//! "Edit with JS Paint" registration for Windows.
//!
//! Release builds on Windows drop a `.reg` file next to the executable. The
//! user can merge it to make the "Edit" verb on images open this program.

use std::io;
use std::path::{Path, PathBuf};

pub const REGISTRY_FILE_NAME: &str = "set-jspaint-as-default-image-editor.reg";

/// Contents of the registry file for an executable at `exe`.
pub fn registry_file_contents(exe: &Path) -> String {
    let exe = reg_escape(&exe.to_string_lossy());
    format!(
        "Windows Registry Editor Version 5.00\r\n\
         \r\n\
         [HKEY_CLASSES_ROOT\\SystemFileAssociations\\image\\shell\\edit\\command]\r\n\
         @=\"\\\"{exe}\\\" \\\"%1\\\"\"\r\n"
    )
}

/// Write the registry file into `dir`, returning its path.
pub fn write_registry_file(dir: &Path, exe: &Path) -> io::Result<PathBuf> {
    let path = dir.join(REGISTRY_FILE_NAME);
    std::fs::write(&path, registry_file_contents(exe))?;
    Ok(path)
}

fn reg_escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_file_quotes_and_escapes_executable() {
        let contents = registry_file_contents(Path::new(r"C:\Program Files\JS Paint\jspaint.exe"));
        assert!(contents.starts_with("Windows Registry Editor Version 5.00\r\n"));
        assert!(contents.contains(
            r"[HKEY_CLASSES_ROOT\SystemFileAssociations\image\shell\edit\command]"
        ));
        assert!(contents.contains(
            r#"@="\"C:\\Program Files\\JS Paint\\jspaint.exe\" \"%1\"""#
        ));
    }

    #[test]
    fn writes_into_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_registry_file(dir.path(), Path::new("jspaint.exe")).unwrap();
        assert_eq!(path.file_name().unwrap(), REGISTRY_FILE_NAME);
        let written = std::fs::read_to_string(path).unwrap();
        assert!(written.contains(r#"\"jspaint.exe\""#));
    }
}
