//! Device identity.
//!
//! The protocol library presents itself to the server as an Android device.
//! [`DeviceInfo`] is that identity; [`DeviceInfoConfiguration`] decides where
//! it comes from.
//!
//! Paths in device info configuration may contain `$CODE$`, which is
//! replaced by the bot code, and may be prefixed with `file:` (local file
//! only), `classpath:` or `classpath*:` (resource root only). Unprefixed paths
//! try the local file first and then the resource root.

use std::path::{Path, PathBuf};

use md5::{Digest, Md5};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::error::{ConfigError, ConfigResult};
use super::password::CODE_MARK;

/// Seed used by [`simbot_device_info`] when none is configured.
pub const DEFAULT_DEVICE_INFO_SEED: i64 = 1;

const LOCAL_FILE_PREFIX: &str = "file:";
const CLASSPATH_PREFIX: &str = "classpath:";
const MULTI_CLASSPATH_PREFIX: &str = "classpath*:";

// =============================================================================
// Device info
// =============================================================================

/// Android version block of a [`DeviceInfo`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceVersion {
    /// Build incremental.
    pub incremental: Vec<u8>,
    /// Release name.
    pub release: Vec<u8>,
    /// Codename.
    pub codename: Vec<u8>,
    /// SDK level.
    pub sdk: i32,
}

impl Default for DeviceVersion {
    fn default() -> Self {
        Self {
            incremental: b"5891938".to_vec(),
            release: b"10".to_vec(),
            codename: b"REL".to_vec(),
            sdk: 29,
        }
    }
}

/// The device identity presented to the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    pub display: Vec<u8>,
    pub product: Vec<u8>,
    pub device: Vec<u8>,
    pub board: Vec<u8>,
    pub brand: Vec<u8>,
    pub model: Vec<u8>,
    pub bootloader: Vec<u8>,
    pub fingerprint: Vec<u8>,
    pub boot_id: Vec<u8>,
    pub proc_version: Vec<u8>,
    pub base_band: Vec<u8>,
    #[serde(default)]
    pub version: DeviceVersion,
    pub sim_info: Vec<u8>,
    pub os_type: Vec<u8>,
    pub mac_address: Vec<u8>,
    #[serde(rename = "wifiBSSID")]
    pub wifi_bssid: Vec<u8>,
    #[serde(rename = "wifiSSID")]
    pub wifi_ssid: Vec<u8>,
    pub imsi_md5: Vec<u8>,
    pub imei: String,
    pub apn: Vec<u8>,
}

/// Version block of a [`SimpleDeviceInfo`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimpleVersion {
    pub incremental: String,
    pub release: String,
    pub codename: String,
    pub sdk: i32,
}

impl Default for SimpleVersion {
    fn default() -> Self {
        Self {
            incremental: "5891938".into(),
            release: "10".into(),
            codename: "REL".into(),
            sdk: 29,
        }
    }
}

/// [`DeviceInfo`] with every byte field written as text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimpleDeviceInfo {
    pub display: String,
    pub product: String,
    pub device: String,
    pub board: String,
    pub brand: String,
    pub model: String,
    pub bootloader: String,
    pub fingerprint: String,
    pub boot_id: String,
    pub proc_version: String,
    pub base_band: String,
    #[serde(default)]
    pub version: SimpleVersion,
    pub sim_info: String,
    pub os_type: String,
    pub mac_address: String,
    #[serde(rename = "wifiBSSID")]
    pub wifi_bssid: String,
    #[serde(rename = "wifiSSID")]
    pub wifi_ssid: String,
    pub imsi_md5: String,
    pub imei: String,
    pub apn: String,
}

fn text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

impl From<&SimpleDeviceInfo> for DeviceInfo {
    fn from(s: &SimpleDeviceInfo) -> Self {
        Self {
            display: s.display.as_bytes().to_vec(),
            product: s.product.as_bytes().to_vec(),
            device: s.device.as_bytes().to_vec(),
            board: s.board.as_bytes().to_vec(),
            brand: s.brand.as_bytes().to_vec(),
            model: s.model.as_bytes().to_vec(),
            bootloader: s.bootloader.as_bytes().to_vec(),
            fingerprint: s.fingerprint.as_bytes().to_vec(),
            boot_id: s.boot_id.as_bytes().to_vec(),
            proc_version: s.proc_version.as_bytes().to_vec(),
            base_band: s.base_band.as_bytes().to_vec(),
            version: DeviceVersion {
                incremental: s.version.incremental.as_bytes().to_vec(),
                release: s.version.release.as_bytes().to_vec(),
                codename: s.version.codename.as_bytes().to_vec(),
                sdk: s.version.sdk,
            },
            sim_info: s.sim_info.as_bytes().to_vec(),
            os_type: s.os_type.as_bytes().to_vec(),
            mac_address: s.mac_address.as_bytes().to_vec(),
            wifi_bssid: s.wifi_bssid.as_bytes().to_vec(),
            wifi_ssid: s.wifi_ssid.as_bytes().to_vec(),
            imsi_md5: s.imsi_md5.as_bytes().to_vec(),
            imei: s.imei.clone(),
            apn: s.apn.as_bytes().to_vec(),
        }
    }
}

impl From<&DeviceInfo> for SimpleDeviceInfo {
    fn from(d: &DeviceInfo) -> Self {
        Self {
            display: text(&d.display),
            product: text(&d.product),
            device: text(&d.device),
            board: text(&d.board),
            brand: text(&d.brand),
            model: text(&d.model),
            bootloader: text(&d.bootloader),
            fingerprint: text(&d.fingerprint),
            boot_id: text(&d.boot_id),
            proc_version: text(&d.proc_version),
            base_band: text(&d.base_band),
            version: SimpleVersion {
                incremental: text(&d.version.incremental),
                release: text(&d.version.release),
                codename: text(&d.version.codename),
                sdk: d.version.sdk,
            },
            sim_info: text(&d.sim_info),
            os_type: text(&d.os_type),
            mac_address: text(&d.mac_address),
            wifi_bssid: text(&d.wifi_bssid),
            wifi_ssid: text(&d.wifi_ssid),
            imsi_md5: text(&d.imsi_md5),
            imei: d.imei.clone(),
            apn: text(&d.apn),
        }
    }
}

// =============================================================================
// Generators
// =============================================================================

const ALNUM: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const DIGITS: &[u8] = b"0123456789";

fn random_string(rng: &mut impl Rng, len: usize, charset: &[u8]) -> String {
    (0..len)
        .map(|_| char::from(charset[rng.gen_range(0..charset.len())]))
        .collect()
}

fn random_md5(rng: &mut impl Rng) -> [u8; 16] {
    let mut seed = [0u8; 16];
    rng.fill(&mut seed);
    let mut digest = [0u8; 16];
    digest.copy_from_slice(&Md5::digest(seed));
    digest
}

fn generate(rng: &mut impl Rng) -> DeviceInfo {
    let fingerprint = format!(
        "mamoe/mirai/mirai:10/MIRAI.200122.001/{}:user/release-keys",
        random_string(rng, 7, DIGITS)
    );
    let boot_id = random_md5(rng).to_vec();
    let proc_version = format!(
        "Linux version 3.0.31-{} (android-build@xxx.xxx.xxx.xxx.com)",
        random_string(rng, 8, ALNUM)
    );
    let imsi_md5 = random_md5(rng).to_vec();
    let imei = random_string(rng, 15, DIGITS);

    DeviceInfo {
        display: b"MIRAI-SIMBOT.200122.001".to_vec(),
        product: b"mirai-simbot".to_vec(),
        device: b"mirai-simbot".to_vec(),
        board: b"mirai-simbot".to_vec(),
        brand: b"forte".to_vec(),
        model: b"mirai-simbot".to_vec(),
        bootloader: b"unknown".to_vec(),
        fingerprint: fingerprint.into_bytes(),
        boot_id,
        proc_version: proc_version.into_bytes(),
        base_band: Vec::new(),
        version: DeviceVersion::default(),
        sim_info: b"T-Mobile".to_vec(),
        os_type: b"android".to_vec(),
        mac_address: b"02:00:00:00:00:00".to_vec(),
        wifi_bssid: b"02:00:00:00:00:00".to_vec(),
        wifi_ssid: b"<unknown ssid>".to_vec(),
        imsi_md5,
        imei,
        apn: b"wifi".to_vec(),
    }
}

/// Deterministic device info for a bot code.
///
/// The same `(code, seed)` always produces the same identity.
pub fn simbot_device_info(code: i64, seed: i64) -> DeviceInfo {
    let mut rng = StdRng::seed_from_u64(code.wrapping_mul(seed) as u64);
    generate(&mut rng)
}

/// Random device info, reproducible when a seed is given.
pub fn random_device_info(seed: Option<i64>) -> DeviceInfo {
    match seed {
        Some(seed) => generate(&mut StdRng::seed_from_u64(seed as u64)),
        None => generate(&mut StdRng::from_entropy()),
    }
}

// =============================================================================
// Configuration
// =============================================================================

fn default_simbot_seed() -> i64 {
    DEFAULT_DEVICE_INFO_SEED
}

fn default_device_file() -> String {
    "device.json".into()
}

/// Where a bot's device info comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeviceInfoConfiguration {
    /// [`simbot_device_info`] with a seed.
    SimbotRandom {
        #[serde(default = "default_simbot_seed")]
        seed: i64,
    },
    /// [`random_device_info`].
    Random {
        #[serde(default)]
        seed: Option<i64>,
    },
    /// The first readable path.
    Resource { paths: Vec<String> },
    /// A local file, generated on first use.
    FileBased {
        #[serde(default = "default_device_file")]
        file: String,
        /// Resource copied to `file` when it does not exist yet.
        #[serde(default, rename = "fromResource")]
        from_resource: Option<String>,
    },
    /// Inline device info.
    Object { object: DeviceInfo },
    /// Inline device info in text form.
    SimpleObject { object: SimpleDeviceInfo },
    /// `device-$CODE$.json`, then `device.json` under `baseDir`, falling
    /// back to [`FileBased`](Self::FileBased).
    Auto {
        #[serde(default, rename = "baseDir")]
        base_dir: Option<String>,
        #[serde(default = "default_device_file", rename = "fileBasedFilename")]
        file_based_filename: String,
    },
}

impl DeviceInfoConfiguration {
    /// Produces device info for the bot `code`.
    ///
    /// `resource_root` is the directory `classpath:` paths resolve against.
    pub fn resolve(&self, code: i64, resource_root: &Path) -> ConfigResult<DeviceInfo> {
        let code_text = code.to_string();
        let mark = |s: &str| s.replace(CODE_MARK, &code_text);

        match self {
            Self::SimbotRandom { seed } => Ok(simbot_device_info(code, *seed)),
            Self::Random { seed } => Ok(random_device_info(*seed)),
            Self::Resource { paths } => {
                if paths.is_empty() {
                    return Err(ConfigError::EmptyResourcePaths);
                }
                let resolved: Vec<String> = paths.iter().map(|p| mark(p)).collect();
                for path in &resolved {
                    if let Some(file) = locate(path, resource_root) {
                        return load_device_info(&file);
                    }
                }
                Err(ConfigError::DeviceInfoNotFound(resolved))
            }
            Self::FileBased {
                file,
                from_resource,
            } => {
                let target = PathBuf::from(mark(file));
                let from_resource = from_resource.as_deref().map(|r| mark(r));
                file_based(code, &target, from_resource.as_deref(), resource_root)
            }
            Self::Object { object } => Ok(object.clone()),
            Self::SimpleObject { object } => Ok(DeviceInfo::from(object)),
            Self::Auto {
                base_dir,
                file_based_filename,
            } => {
                if let Some(base_dir) = base_dir {
                    let base_dir = PathBuf::from(mark(base_dir));
                    for name in [format!("device-{CODE_MARK}.json"), "device.json".to_string()] {
                        let path = base_dir.join(mark(&name));
                        if path.is_file() {
                            return load_device_info(&path);
                        }
                        debug!(path = %path.display(), "No device info found on path");

                        let resource = resource_root.join(&path);
                        if resource.is_file() {
                            return load_device_info(&resource);
                        }
                        debug!(path = %resource.display(), "No device info found on resource");
                    }
                    debug!(
                        file = %file_based_filename,
                        "No device info file found in target paths, falling back to file based"
                    );
                }
                file_based(
                    code,
                    &PathBuf::from(mark(file_based_filename)),
                    None,
                    resource_root,
                )
            }
        }
    }
}

fn locate(path: &str, resource_root: &Path) -> Option<PathBuf> {
    let candidates: Vec<PathBuf> = if let Some(p) = path.strip_prefix(LOCAL_FILE_PREFIX) {
        vec![PathBuf::from(p)]
    } else if let Some(p) = path.strip_prefix(MULTI_CLASSPATH_PREFIX) {
        vec![resource_root.join(p)]
    } else if let Some(p) = path.strip_prefix(CLASSPATH_PREFIX) {
        vec![resource_root.join(p)]
    } else {
        vec![PathBuf::from(path), resource_root.join(path)]
    };
    candidates.into_iter().find(|p| p.is_file())
}

fn file_based(
    code: i64,
    target: &Path,
    from_resource: Option<&str>,
    resource_root: &Path,
) -> ConfigResult<DeviceInfo> {
    if !target.exists()
        && let Some(resource) = from_resource
    {
        let source = resource_root.join(resource);
        if source.is_file() {
            if let Err(e) = std::fs::copy(&source, target) {
                warn!(
                    resource = %source.display(),
                    file = %target.display(),
                    error = %e,
                    "Unable to copy device info resource"
                );
            }
        } else {
            warn!(
                resource = %source.display(),
                file = %target.display(),
                "Device info file does not exist and the resource cannot be found, skip copying"
            );
        }
    }

    if target.exists() {
        return load_device_info(target);
    }

    let info = simbot_device_info(code, DEFAULT_DEVICE_INFO_SEED);
    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| ConfigError::DeviceInfoRead {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let json = serde_json::to_string_pretty(&info).map_err(|source| ConfigError::DeviceInfoParse {
        path: target.to_path_buf(),
        source,
    })?;
    std::fs::write(target, json).map_err(|source| ConfigError::DeviceInfoRead {
        path: target.to_path_buf(),
        source,
    })?;
    debug!(file = %target.display(), "Generated device info");
    Ok(info)
}

/// Reads device info from a JSON file in either the byte or the text form.
pub fn load_device_info(path: &Path) -> ConfigResult<DeviceInfo> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::DeviceInfoRead {
        path: path.to_path_buf(),
        source,
    })?;

    match serde_json::from_str::<DeviceInfo>(&content) {
        Ok(info) => Ok(info),
        Err(direct) => {
            debug!(
                path = %path.display(),
                error = %direct,
                "Direct device info deserialization failed, trying the text form"
            );
            serde_json::from_str::<SimpleDeviceInfo>(&content)
                .map(|simple| DeviceInfo::from(&simple))
                .map_err(|_| ConfigError::DeviceInfoParse {
                    path: path.to_path_buf(),
                    source: direct,
                })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("simbot-mirai-{name}-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_simbot_device_info_fixed_fields() {
        let info = simbot_device_info(123456, 1);
        assert_eq!(info.display, b"MIRAI-SIMBOT.200122.001");
        assert_eq!(info.brand, b"forte");
        assert_eq!(info.wifi_ssid, b"<unknown ssid>");
        assert_eq!(info.version.sdk, 29);
        assert_eq!(info.imei.len(), 15);
        assert!(info.imei.chars().all(|c| c.is_ascii_digit()));
        assert_eq!(info.imsi_md5.len(), 16);
        assert_eq!(info.boot_id.len(), 16);
        assert_ne!(info.boot_id, info.imsi_md5);

        let fingerprint = String::from_utf8(info.fingerprint.clone()).unwrap();
        assert!(fingerprint.starts_with("mamoe/mirai/mirai:10/MIRAI.200122.001/"));
        assert!(fingerprint.ends_with(":user/release-keys"));
    }

    #[test]
    fn test_simbot_device_info_is_deterministic() {
        assert_eq!(simbot_device_info(10001, 1), simbot_device_info(10001, 1));
        assert_ne!(simbot_device_info(10001, 1).imei, simbot_device_info(10001, 2).imei);
        assert_eq!(random_device_info(Some(7)), random_device_info(Some(7)));
    }

    #[test]
    fn test_simple_conversion_keeps_text() {
        let info = simbot_device_info(1, 1);
        let simple = SimpleDeviceInfo::from(&info);
        assert_eq!(simple.model, "mirai-simbot");
        assert_eq!(simple.version.incremental, "5891938");
        assert_eq!(DeviceInfo::from(&simple).fingerprint, info.fingerprint);
    }

    #[test]
    fn test_deserialize_configuration() {
        let config: DeviceInfoConfiguration =
            serde_yaml::from_str("type: auto\nbaseDir: devices\n").unwrap();
        assert_eq!(
            config,
            DeviceInfoConfiguration::Auto {
                base_dir: Some("devices".into()),
                file_based_filename: "device.json".into(),
            }
        );

        let config: DeviceInfoConfiguration = serde_json::from_str(r#"{"type":"simbot_random"}"#).unwrap();
        assert_eq!(config, DeviceInfoConfiguration::SimbotRandom { seed: 1 });
    }

    #[test]
    fn test_resource_paths() {
        let root = temp_dir("resource");
        let info = simbot_device_info(42, 1);
        std::fs::write(root.join("device-42.json"), serde_json::to_string(&info).unwrap()).unwrap();

        let config = DeviceInfoConfiguration::Resource {
            paths: vec![
                "file:/definitely/missing/device.json".into(),
                "classpath:device-$CODE$.json".into(),
            ],
        };
        assert_eq!(config.resolve(42, &root).unwrap(), info);

        let missing = DeviceInfoConfiguration::Resource {
            paths: vec!["classpath:nothing.json".into()],
        };
        assert!(matches!(
            missing.resolve(42, &root),
            Err(ConfigError::DeviceInfoNotFound(_))
        ));

        let empty = DeviceInfoConfiguration::Resource { paths: vec![] };
        assert!(matches!(empty.resolve(42, &root), Err(ConfigError::EmptyResourcePaths)));
    }

    #[test]
    fn test_file_based_generates_then_reuses() {
        let root = temp_dir("file-based");
        let file = root.join("bots/device-$CODE$.json");
        let config = DeviceInfoConfiguration::FileBased {
            file: file.to_string_lossy().into_owned(),
            from_resource: None,
        };

        let first = config.resolve(77, &root).unwrap();
        assert!(root.join("bots/device-77.json").is_file());
        assert_eq!(first, simbot_device_info(77, DEFAULT_DEVICE_INFO_SEED));
        assert_eq!(config.resolve(77, &root).unwrap(), first);
    }

    #[test]
    fn test_load_text_form() {
        let root = temp_dir("simple");
        let simple = SimpleDeviceInfo::from(&simbot_device_info(5, 1));
        let path = root.join("device.json");
        std::fs::write(&path, serde_json::to_string(&simple).unwrap()).unwrap();
        assert_eq!(load_device_info(&path).unwrap(), DeviceInfo::from(&simple));

        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(
            load_device_info(&path),
            Err(ConfigError::DeviceInfoParse { .. })
        ));
    }
}
