//! Unpacks a `.deb`'s `data.tar` member directly into the target root for
//! the `extract` action, bypassing dpkg entirely (no pre/post-install
//! scripts run for this action kind).
//!
//! A `.deb` is an `ar` archive of `debian-binary`, `control.tar.*`, and
//! `data.tar.*`. Only the `data.tar` member matters here; `control.tar`
//! (maintainer scripts, `md5sums`) is left for whichever later action
//! actually runs dpkg.

use std::io::Read;

use camino::Utf8Path;

use crate::error::RdebootstrapError;

/// Extracts the `data.tar.{gz,xz,zst,}` member of `deb_path` directly
/// onto `target_root`.
pub fn extract_data_tar(deb_path: &Utf8Path, target_root: &Utf8Path) -> Result<(), RdebootstrapError> {
    let file = std::fs::File::open(deb_path).map_err(|e| RdebootstrapError::io(deb_path.to_string(), e))?;
    let mut archive = ar::Archive::new(file);

    while let Some(entry) = archive.next_entry() {
        let mut entry = entry.map_err(|e| RdebootstrapError::DownloadParse {
            what: deb_path.to_string(),
            reason: format!("malformed ar archive: {e}"),
        })?;
        let name = String::from_utf8_lossy(entry.header().identifier()).into_owned();

        if let Some(codec) = data_tar_codec(&name) {
            let mut bytes = Vec::new();
            entry
                .read_to_end(&mut bytes)
                .map_err(|e| RdebootstrapError::io(format!("{deb_path}:{name}"), e))?;
            return unpack_tar(codec, &bytes, target_root, deb_path);
        }
    }

    Err(RdebootstrapError::DownloadParse {
        what: deb_path.to_string(),
        reason: "no data.tar member found in ar archive".to_string(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Codec {
    Plain,
    Gzip,
    Xz,
    Zstd,
}

fn data_tar_codec(member_name: &str) -> Option<Codec> {
    match member_name {
        "data.tar" => Some(Codec::Plain),
        "data.tar.gz" => Some(Codec::Gzip),
        "data.tar.xz" => Some(Codec::Xz),
        "data.tar.zst" => Some(Codec::Zstd),
        _ => None,
    }
}

fn unpack_tar(codec: Codec, bytes: &[u8], target_root: &Utf8Path, deb_path: &Utf8Path) -> Result<(), RdebootstrapError> {
    let decompress_err = |reason: String| RdebootstrapError::Decompress {
        what: deb_path.to_string(),
        reason,
    };

    match codec {
        Codec::Plain => unpack_tar_reader(bytes, target_root, deb_path),
        Codec::Gzip => {
            let mut decoder = flate2::read::GzDecoder::new(bytes);
            let mut out = Vec::new();
            decoder
                .read_to_end(&mut out)
                .map_err(|e| decompress_err(e.to_string()))?;
            unpack_tar_reader(&out, target_root, deb_path)
        }
        Codec::Xz => {
            let mut decoder = xz2::read::XzDecoder::new(bytes);
            let mut out = Vec::new();
            decoder
                .read_to_end(&mut out)
                .map_err(|e| decompress_err(e.to_string()))?;
            unpack_tar_reader(&out, target_root, deb_path)
        }
        Codec::Zstd => {
            let out = zstd::stream::decode_all(bytes).map_err(|e| decompress_err(e.to_string()))?;
            unpack_tar_reader(&out, target_root, deb_path)
        }
    }
}

fn unpack_tar_reader(bytes: &[u8], target_root: &Utf8Path, deb_path: &Utf8Path) -> Result<(), RdebootstrapError> {
    let mut archive = tar::Archive::new(bytes);
    archive.set_preserve_permissions(true);
    archive.set_unpack_xattrs(true);
    archive
        .unpack(target_root.as_std_path())
        .map_err(|e| RdebootstrapError::Io {
            context: format!("extracting {deb_path} into {target_root}"),
            message: e.to_string(),
            source: e,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn build_test_deb(data_tar_member: &str, data_tar_bytes: &[u8]) -> Vec<u8> {
        let mut buf = Vec::new();
        {
            let mut builder = ar::Builder::new(&mut buf);
            let header = ar::Header::new(b"debian-binary".to_vec(), 4);
            builder.append(&header, &b"2.0\n"[..]).unwrap();
            let header = ar::Header::new(data_tar_member.as_bytes().to_vec(), data_tar_bytes.len() as u64);
            builder.append(&header, data_tar_bytes).unwrap();
        }
        buf
    }

    fn build_plain_tar(path_in_tar: &str, contents: &[u8]) -> Vec<u8> {
        let mut buf = Vec::new();
        {
            let mut builder = tar::Builder::new(&mut buf);
            let mut header = tar::Header::new_gnu();
            header.set_size(contents.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, path_in_tar, contents).unwrap();
            builder.finish().unwrap();
        }
        buf
    }

    #[test]
    fn extracts_plain_data_tar() {
        let tar_bytes = build_plain_tar("./usr/bin/true", b"fake binary");
        let deb_bytes = build_test_deb("data.tar", &tar_bytes);

        let dir = tempfile::tempdir().unwrap();
        let deb_path = camino::Utf8Path::from_path(dir.path()).unwrap().join("pkg.deb");
        std::fs::write(&deb_path, &deb_bytes).unwrap();

        let target = dir.path().join("target");
        std::fs::create_dir(&target).unwrap();
        let target = camino::Utf8Path::from_path(&target).unwrap();

        extract_data_tar(&deb_path, target).unwrap();
        assert_eq!(std::fs::read(target.join("usr/bin/true")).unwrap(), b"fake binary");
    }

    #[test]
    fn extracts_gzip_data_tar() {
        let tar_bytes = build_plain_tar("./etc/test", b"contents");
        let mut gz_bytes = Vec::new();
        {
            let mut encoder = flate2::write::GzEncoder::new(&mut gz_bytes, flate2::Compression::default());
            encoder.write_all(&tar_bytes).unwrap();
            encoder.finish().unwrap();
        }
        let deb_bytes = build_test_deb("data.tar.gz", &gz_bytes);

        let dir = tempfile::tempdir().unwrap();
        let deb_path = camino::Utf8Path::from_path(dir.path()).unwrap().join("pkg.deb");
        std::fs::write(&deb_path, &deb_bytes).unwrap();

        let target = dir.path().join("target");
        std::fs::create_dir(&target).unwrap();
        let target = camino::Utf8Path::from_path(&target).unwrap();

        extract_data_tar(&deb_path, target).unwrap();
        assert_eq!(std::fs::read(target.join("etc/test")).unwrap(), b"contents");
    }

    #[test]
    fn missing_data_tar_member_is_an_error() {
        let deb_bytes = build_test_deb("control.tar.gz", b"irrelevant");
        let dir = tempfile::tempdir().unwrap();
        let deb_path = camino::Utf8Path::from_path(dir.path()).unwrap().join("pkg.deb");
        std::fs::write(&deb_path, &deb_bytes).unwrap();

        let target = camino::Utf8Path::from_path(dir.path()).unwrap().to_path_buf();
        assert!(extract_data_tar(&deb_path, &target).is_err());
    }
}
