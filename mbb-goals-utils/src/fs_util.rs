use std::{fmt::Debug, path::Path, path::PathBuf};

use anyhow::Context;
use serde::Deserialize;

pub fn read_toml<P: Into<PathBuf> + Debug, T: for<'de> Deserialize<'de>>(
    path: P,
) -> anyhow::Result<T> {
    let path = path.into();
    (|| toml::from_str(&fs_err::read_to_string(&path)?).map_err(anyhow::Error::new))().with_context(
        || {
            format!(
                "While trying to parse {path:?} as {}",
                std::any::type_name::<T>()
            )
        },
    )
}

/// Creates the directory that will contain `path`, if any.
pub fn create_parent_dir(path: &Path) -> anyhow::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => Ok(fs_err::create_dir_all(parent)?),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::{create_parent_dir, read_toml};

    #[derive(Debug, PartialEq, Deserialize)]
    struct Sample {
        name: String,
        delay: f64,
    }

    #[test]
    fn test_read_toml() {
        let dir = std::env::temp_dir().join(format!("mbb-goals-utils-{}", std::process::id()));
        let path = dir.join("nested").join("sample.toml");
        create_parent_dir(&path).unwrap();
        fs_err::write(&path, "name = \"CNU\"\ndelay = 0.5\n").unwrap();
        let sample: Sample = read_toml(&path).unwrap();
        assert_eq!(
            sample,
            Sample {
                name: "CNU".to_owned(),
                delay: 0.5
            }
        );

        fs_err::write(&path, "name = 3\n").unwrap();
        let err = read_toml::<_, Sample>(&path).unwrap_err();
        assert!(format!("{err:#}").contains("While trying to parse"));

        fs_err::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_create_parent_dir_without_parent() {
        create_parent_dir("games.csv".as_ref()).unwrap();
    }
}
