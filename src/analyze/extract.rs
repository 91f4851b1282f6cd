use crate::core::errors::KithoundError;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Ephemeral extraction root, one subdirectory per kit. The backing
/// temp dir is removed when the workspace drops, success or not.
pub struct Workspace {
    root: TempDir,
}

impl Workspace {
    pub fn new() -> Result<Self, KithoundError> {
        let root = TempDir::new()
            .map_err(|e| KithoundError::Extraction(format!("cannot create workspace: {}", e)))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        self.root.path()
    }

    /// Unpacks one archive into its own subdirectory, dispatched by
    /// extension. Failures are per-archive: the caller records them on
    /// the kit and moves on.
    pub fn extract(&self, archive: &Path, ext: &str) -> Result<PathBuf, KithoundError> {
        let kit_name = kit_name(archive, ext)
            .ok_or_else(|| KithoundError::Extraction(format!("bad archive name: {:?}", archive)))?;
        let dest = self.root.path().join(kit_name);

        match ext {
            ".zip" => extract_zip(archive, &dest)?,
            ".tar.gz" | ".tgz" => extract_tar_gz(archive, &dest)?,
            other => {
                return Err(KithoundError::Extraction(format!(
                    "unsupported archive extension: {}",
                    other
                )))
            }
        }
        Ok(dest)
    }
}

/// Archive file name minus its extension; the key kits are tracked by.
pub fn kit_name(archive: &Path, ext: &str) -> Option<String> {
    archive
        .file_name()?
        .to_str()?
        .strip_suffix(ext)
        .map(str::to_string)
}

fn extract_zip(archive: &Path, dest: &Path) -> Result<(), KithoundError> {
    let file = File::open(archive)
        .map_err(|e| KithoundError::Extraction(format!("cannot open {:?}: {}", archive, e)))?;
    let mut zip = zip::ZipArchive::new(file)
        .map_err(|e| KithoundError::Extraction(format!("not a zip archive: {}", e)))?;

    for i in 0..zip.len() {
        let mut member = zip
            .by_index(i)
            .map_err(|e| KithoundError::Extraction(format!("corrupt zip member: {}", e)))?;
        // enclosed_name rejects absolute paths and `..` traversal.
        let Some(relative) = member.enclosed_name() else {
            return Err(KithoundError::Extraction(format!(
                "unsafe path in archive: {}",
                member.name()
            )));
        };
        let out = dest.join(relative);

        if member.is_dir() {
            fs::create_dir_all(&out)?;
        } else {
            if let Some(parent) = out.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut outfile = File::create(&out)?;
            std::io::copy(&mut member, &mut outfile)
                .map_err(|e| KithoundError::Extraction(format!("zip member write: {}", e)))?;
        }
    }
    Ok(())
}

fn extract_tar_gz(archive: &Path, dest: &Path) -> Result<(), KithoundError> {
    let file = File::open(archive)
        .map_err(|e| KithoundError::Extraction(format!("cannot open {:?}: {}", archive, e)))?;
    let decoder = flate2::read::GzDecoder::new(file);
    let mut tar = tar::Archive::new(decoder);
    // unpack already refuses members escaping the destination.
    tar.unpack(dest)
        .map_err(|e| KithoundError::Extraction(format!("tar unpack: {}", e)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_zip(path: &Path, entries: &[(&str, &str)]) {
        let file = File::create(path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default();
        for (name, content) in entries {
            writer.start_file(*name, options).unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        writer.finish().unwrap();
    }

    fn write_tar_gz(path: &Path, entries: &[(&str, &str)]) {
        let file = File::create(path).unwrap();
        let encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
        let mut builder = tar::Builder::new(encoder);
        for (name, content) in entries {
            let mut header = tar::Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, name, content.as_bytes()).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap();
    }

    #[test]
    fn zip_unpacks_into_named_subdir() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("store#ab12c.zip");
        write_zip(&archive, &[("index.php", "<?php mail(); ?>"), ("css/site.css", "body{}")]);

        let ws = Workspace::new().unwrap();
        let kit_dir = ws.extract(&archive, ".zip").unwrap();
        assert_eq!(kit_dir.file_name().unwrap(), "store#ab12c");
        assert!(kit_dir.join("index.php").exists());
        assert!(kit_dir.join("css/site.css").exists());
    }

    #[test]
    fn tar_gz_unpacks() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("shop#00f13.tar.gz");
        write_tar_gz(&archive, &[("login.html", "<form>")]);

        let ws = Workspace::new().unwrap();
        let kit_dir = ws.extract(&archive, ".tar.gz").unwrap();
        assert!(kit_dir.join("login.html").exists());
    }

    #[test]
    fn corrupt_archive_is_a_per_kit_error() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("bad#aaaaa.zip");
        std::fs::write(&archive, b"\xff\xfenot a zip").unwrap();

        let ws = Workspace::new().unwrap();
        assert!(matches!(
            ws.extract(&archive, ".zip"),
            Err(KithoundError::Extraction(_))
        ));
    }

    #[test]
    fn unsupported_extension_rejected() {
        let ws = Workspace::new().unwrap();
        assert!(matches!(
            ws.extract(Path::new("kit#aaaaa.rar"), ".rar"),
            Err(KithoundError::Extraction(_))
        ));
    }

    #[test]
    fn workspace_is_destroyed_on_drop() {
        let root;
        {
            let ws = Workspace::new().unwrap();
            root = ws.root().to_path_buf();
            assert!(root.exists());
        }
        assert!(!root.exists());
    }
}
