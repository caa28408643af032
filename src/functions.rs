use crate::{constants::BACKUP_SUFFIX, types::Error};
use std::{
    fs::{self, File},
    io::{BufReader, Read, Write},
    path::{Path, PathBuf},
};

/// This function is exactly similar to `std::fs::read_to_string`, but it
/// doesn't include Byte Order Mark, if there's any.
pub fn read_to_string_without_bom<P: AsRef<Path>>(
    file_path: P,
) -> std::io::Result<String> {
    const BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

    let file: File = File::open(file_path.as_ref())?;
    let mut reader: BufReader<File> = BufReader::new(file);

    let mut buffer: [u8; 3] = [0u8; 3];
    let mut content: String = String::new();

    let read_bytes: usize = reader.read(&mut buffer)?;

    if read_bytes == 3 && buffer == BOM {
        reader.read_to_string(&mut content)?;
    } else {
        reader.seek_relative(-(read_bytes as i64))?;
        reader.read_to_string(&mut content)?;
    }

    Ok(content)
}

/// Checks whether text contains characters from the source script's Unicode
/// blocks: hiragana, katakana, CJK ideographs, fullwidth forms.
#[must_use]
pub fn contains_source_text(text: &str) -> bool {
    text.chars().any(|char| {
        matches!(
            char,
            '\u{3040}'..='\u{309F}'
                | '\u{30A0}'..='\u{30FF}'
                | '\u{4E00}'..='\u{9FFF}'
                | '\u{FF00}'..='\u{FFEF}'
        )
    })
}

/// Stricter check used for plugin parameters: requires actual
/// hiragana/katakana/kanji, excluding fullwidth Latin forms which
/// [`contains_source_text`] accepts.
#[must_use]
pub fn contains_display_script(text: &str) -> bool {
    text.chars().any(|char| {
        matches!(
            char,
            '\u{3040}'..='\u{309F}'
                | '\u{30A0}'..='\u{30FF}'
                | '\u{4E00}'..='\u{9FFF}'
                | '\u{3400}'..='\u{4DBF}'
        )
    })
}

pub(crate) fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> Error + '_ {
    |err| Error::Io(path.to_path_buf(), err)
}

/// Writes a file atomically: the content goes to a sibling temp file which
/// then replaces the target, so an interrupted write never corrupts it.
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<(), Error> {
    let mut temp_path = path.as_os_str().to_owned();
    temp_path.push(".tmp");
    let temp_path = PathBuf::from(temp_path);

    let mut file = File::create(&temp_path).map_err(io_error(&temp_path))?;
    file.write_all(content).map_err(io_error(&temp_path))?;
    file.sync_all().map_err(io_error(&temp_path))?;
    drop(file);

    fs::rename(&temp_path, path).map_err(io_error(path))
}

fn copy_dir_recursive(source: &Path, target: &Path) -> std::io::Result<()> {
    fs::create_dir_all(target)?;

    for entry in fs::read_dir(source)? {
        let entry = entry?;
        let target_path = target.join(entry.file_name());

        if entry.file_type()?.is_dir() {
            copy_dir_recursive(&entry.path(), &target_path)?;
        } else {
            fs::copy(entry.path(), target_path)?;
        }
    }

    Ok(())
}

/// Returns the backup path for a game directory or file, e.g.
/// `data` → `data_original`, `plugins.js` → `plugins_original.js`.
#[must_use]
pub fn backup_path(path: &Path) -> PathBuf {
    match path.extension() {
        Some(extension) => {
            let stem = path.file_stem().unwrap_or_default().to_string_lossy();
            path.with_file_name(format!(
                "{stem}{BACKUP_SUFFIX}.{}",
                extension.to_string_lossy()
            ))
        }
        None => {
            let mut name = path.as_os_str().to_owned();
            name.push(BACKUP_SUFFIX);
            PathBuf::from(name)
        }
    }
}

/// Copies a directory to its backup sibling unless a backup already exists.
/// An existing backup is never overwritten.
pub fn backup_dir_once(dir: &Path) -> Result<PathBuf, Error> {
    let backup = backup_path(dir);

    if !backup.exists() {
        copy_dir_recursive(dir, &backup).map_err(io_error(&backup))?;
    }

    Ok(backup)
}

/// Copies a file to its backup sibling unless a backup already exists.
pub fn backup_file_once(file: &Path) -> Result<PathBuf, Error> {
    let backup = backup_path(file);

    if !backup.exists() {
        fs::copy(file, &backup).map_err(io_error(&backup))?;
    }

    Ok(backup)
}
