//! Remote key classification

use std::fmt;
use std::str::FromStr;

use crate::domain::DomainError;

/// Type the remote store reports for a key (the `TYPE` command)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum KeyType {
    /// Key does not exist
    #[default]
    None,
    String,
    Set,
    Hash,
    List,
    ZSet,
    /// Any type the cache has no mirror for (`stream`, `vectorset`, module types)
    Other(String),
}

impl KeyType {
    pub fn as_str(&self) -> &str {
        match self {
            KeyType::None => "none",
            KeyType::String => "string",
            KeyType::Set => "set",
            KeyType::Hash => "hash",
            KeyType::List => "list",
            KeyType::ZSet => "zset",
            KeyType::Other(name) => name,
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KeyType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(KeyType::None),
            "string" => Ok(KeyType::String),
            "set" => Ok(KeyType::Set),
            "hash" => Ok(KeyType::Hash),
            "list" => Ok(KeyType::List),
            "zset" => Ok(KeyType::ZSet),
            "" => Err(DomainError::store("Store reported an empty key type")),
            other => Ok(KeyType::Other(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_type_from_str() {
        assert_eq!("none".parse::<KeyType>().unwrap(), KeyType::None);
        assert_eq!("string".parse::<KeyType>().unwrap(), KeyType::String);
        assert_eq!("set".parse::<KeyType>().unwrap(), KeyType::Set);
        assert_eq!("hash".parse::<KeyType>().unwrap(), KeyType::Hash);
        assert_eq!("list".parse::<KeyType>().unwrap(), KeyType::List);
        assert_eq!("zset".parse::<KeyType>().unwrap(), KeyType::ZSet);
    }

    #[test]
    fn test_key_type_from_str_other() {
        assert_eq!(
            "stream".parse::<KeyType>().unwrap(),
            KeyType::Other("stream".to_string())
        );
        assert_eq!(
            "vectorset".parse::<KeyType>().unwrap().to_string(),
            "vectorset"
        );
    }

    #[test]
    fn test_key_type_from_str_empty() {
        assert!("".parse::<KeyType>().is_err());
    }

    #[test]
    fn test_key_type_display() {
        assert_eq!(KeyType::ZSet.to_string(), "zset");
        assert_eq!(KeyType::default().to_string(), "none");
    }
}
