//! 私钥加载接口。
//!
//! 处理核心从不解析密钥：组件（例如需要签名认证的传输绑定）通过 [`KeyLoader`] 从命名位置取得
//! [`PrivateKeyMaterial`]，核心只把它当作不透明的协作方输出。这里不包含任何密码学实现。

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use bytes::Bytes;
use thiserror::Error;

/// 密钥所在位置，形如 `classpath:org/acme/auth/key.pk8` 或 `file:/etc/courier/key.pk8`。
///
/// 没有前缀的字符串按文件路径处理。
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum KeyLocation {
    /// 随部署打包的资源路径，由加载器决定如何解析。
    Classpath(String),
    File(PathBuf),
}

impl KeyLocation {
    pub fn parse(location: &str) -> Result<Self, KeyLoadError> {
        let trimmed = location.trim();
        let invalid = || KeyLoadError::InvalidLocation {
            location: location.to_owned(),
        };

        if let Some(resource) = trimmed.strip_prefix("classpath:") {
            let resource = resource.trim_start_matches('/');
            if resource.is_empty() {
                return Err(invalid());
            }
            return Ok(Self::Classpath(resource.to_owned()));
        }

        let path = trimmed.strip_prefix("file:").unwrap_or(trimmed);
        if path.is_empty() {
            return Err(invalid());
        }
        Ok(Self::File(PathBuf::from(path)))
    }
}

impl FromStr for KeyLocation {
    type Err = KeyLoadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for KeyLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyLocation::Classpath(resource) => write!(f, "classpath:{resource}"),
            KeyLocation::File(path) => write!(f, "file:{}", path.display()),
        }
    }
}

/// 密钥编码格式。
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum KeyFormat {
    Pkcs8,
    Pkcs1,
    Other(String),
}

impl fmt::Display for KeyFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyFormat::Pkcs8 => f.write_str("PKCS#8"),
            KeyFormat::Pkcs1 => f.write_str("PKCS#1"),
            KeyFormat::Other(name) => f.write_str(name),
        }
    }
}

/// 加载器产出的私钥材料：算法与编码元数据可校验，编码字节保持不透明。
#[derive(Clone, PartialEq, Eq)]
pub struct PrivateKeyMaterial {
    algorithm: String,
    format: KeyFormat,
    encoded: Bytes,
}

impl PrivateKeyMaterial {
    pub fn new(algorithm: impl Into<String>, format: KeyFormat, encoded: impl Into<Bytes>) -> Self {
        Self {
            algorithm: algorithm.into(),
            format,
            encoded: encoded.into(),
        }
    }

    /// 例如 `RSA`。
    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    pub fn format(&self) -> &KeyFormat {
        &self.format
    }

    pub fn encoded(&self) -> &Bytes {
        &self.encoded
    }
}

// 不输出密钥字节。
impl fmt::Debug for PrivateKeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKeyMaterial")
            .field("algorithm", &self.algorithm)
            .field("format", &self.format)
            .field("encoded", &format_args!("<{} bytes>", self.encoded.len()))
            .finish()
    }
}

/// 私钥加载失败。
#[derive(Debug, Error)]
pub enum KeyLoadError {
    #[error("`{location}` is not a valid key location")]
    InvalidLocation { location: String },

    #[error("no key found at `{location}`")]
    NotFound { location: KeyLocation },

    #[error("failed to read key from `{location}`")]
    Io {
        location: KeyLocation,
        #[source]
        source: std::io::Error,
    },

    #[error("key at `{location}` is not supported: {reason}")]
    Unsupported { location: KeyLocation, reason: String },
}

/// 从命名位置加载私钥的外部协作方。
pub trait KeyLoader: Send + Sync {
    fn load_private_key(&self, location: &KeyLocation) -> Result<PrivateKeyMaterial, KeyLoadError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct InMemoryLoader {
        keys: HashMap<KeyLocation, PrivateKeyMaterial>,
    }

    impl KeyLoader for InMemoryLoader {
        fn load_private_key(&self, location: &KeyLocation) -> Result<PrivateKeyMaterial, KeyLoadError> {
            self.keys
                .get(location)
                .cloned()
                .ok_or_else(|| KeyLoadError::NotFound {
                    location: location.clone(),
                })
        }
    }

    #[test]
    fn parses_locations() {
        assert_eq!(
            KeyLocation::parse("classpath:/org/acme/auth/test2.pk8").expect("合法位置"),
            KeyLocation::Classpath("org/acme/auth/test2.pk8".to_owned())
        );
        assert_eq!(
            "file:/etc/courier/key.pk8".parse::<KeyLocation>().expect("合法位置"),
            KeyLocation::File(PathBuf::from("/etc/courier/key.pk8"))
        );
        assert!(KeyLocation::parse("classpath:").is_err());
        assert!(KeyLocation::parse("  ").is_err());
    }

    #[test]
    fn loader_reports_algorithm_and_format() {
        let location = KeyLocation::parse("classpath:org/acme/auth/test2.pk8").expect("合法位置");
        let loader = InMemoryLoader {
            keys: HashMap::from([(
                location.clone(),
                PrivateKeyMaterial::new("RSA", KeyFormat::Pkcs8, vec![0x30, 0x82]),
            )]),
        };

        let key = loader.load_private_key(&location).expect("密钥存在");
        assert_eq!(key.algorithm(), "RSA");
        assert_eq!(key.format().to_string(), "PKCS#8");
        assert!(!format!("{key:?}").contains("48"));

        let missing = KeyLocation::parse("file:/missing.pk8").expect("合法位置");
        assert!(matches!(
            loader.load_private_key(&missing),
            Err(KeyLoadError::NotFound { .. })
        ));
    }
}
