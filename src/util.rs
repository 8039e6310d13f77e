use std::iter::repeat;
use std::path::{Path, PathBuf};

pub fn find_first_subpath<P: AsRef<Path>, F: Fn(&Path) -> bool>(
    root: impl AsRef<Path>,
    subpaths: &[P],
    search: F,
) -> Option<PathBuf> {
    subpaths
        .iter()
        .zip(repeat(root.as_ref()))
        .map(|(b, a)| a.join(b))
        .find(|it: &PathBuf| search(it))
}

/// `DateTime<Utc>` as whole Unix seconds, the JWT "NumericDate" of RFC 7519 section 2.
pub mod date_time_as_unix_seconds {
    use chrono::{DateTime, TimeZone, Utc};
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_i64(date.timestamp())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Utc.timestamp_opt(i64::deserialize(deserializer)?, 0)
            .single()
            .ok_or_else(|| serde::de::Error::custom("Invalid Unix timestamp value."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_existing_subpath_is_picked() {
        let found = find_first_subpath("/cfg", &["a.yml", "b.yml"], |p| p.ends_with("b.yml"));
        assert_eq!(found, Some(PathBuf::from("/cfg/b.yml")));

        let none = find_first_subpath("/cfg", &["a.yml"], |_| false);
        assert_eq!(none, None);
    }
}
