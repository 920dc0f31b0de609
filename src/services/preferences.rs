use serde_json::{json, Map, Value};
use std::sync::Arc;
use crate::models::{FitPreference, Measurements, OptionsForm, UserMeasurements, UserSettings, WidgetPosition};
use crate::services::storage::{Storage, StorageArea, StorageError};

pub const DEFAULT_API_URL: &str = "http://localhost:8000";

pub const KEY_ENABLED: &str = "enabled";
pub const KEY_API_URL: &str = "apiUrl";
pub const KEY_MEASUREMENTS: &str = "measurements";
pub const KEY_USER_ID: &str = "userId";
pub const KEY_USER_SETTINGS: &str = "pinkvanity:userSettings";
pub const KEY_WIDGET_POSITION: &str = "pinkvanity:widgetPosition";

/// Typed access to user preferences
///
/// Readers never fail on malformed stored data: every value is shaped
/// on read and replaced by its default when it does not fit.
#[derive(Clone)]
pub struct Preferences {
    storage: Arc<Storage>,
    default_api_url: String,
}

impl Preferences {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self::with_default_api_url(storage, DEFAULT_API_URL)
    }

    pub fn with_default_api_url(storage: Arc<Storage>, default_api_url: impl Into<String>) -> Self {
        Self {
            storage,
            default_api_url: default_api_url.into(),
        }
    }

    pub fn storage(&self) -> &Arc<Storage> {
        &self.storage
    }

    pub fn default_api_url(&self) -> &str {
        &self.default_api_url
    }

    /// Wipe both storage areas; readers fall back to defaults afterwards
    pub async fn clear_all(&self) -> Result<(), StorageError> {
        self.storage.clear(StorageArea::Sync).await?;
        self.storage.clear(StorageArea::Local).await
    }

    /// Enabled unless explicitly stored as `false`
    pub async fn is_enabled(&self) -> bool {
        self.storage.get(StorageArea::Sync, KEY_ENABLED).await != Some(Value::Bool(false))
    }

    /// Configured matching API base URL, or the default
    pub async fn api_url(&self) -> String {
        match self.storage.get(StorageArea::Sync, KEY_API_URL).await {
            Some(Value::String(url)) if !url.trim().is_empty() => url,
            _ => self.default_api_url.clone(),
        }
    }

    /// Options-page measurements; `None` when absent or malformed
    pub async fn get_measurements(&self) -> Option<UserMeasurements> {
        let value = self.storage.get(StorageArea::Sync, KEY_MEASUREMENTS).await?;
        match serde_json::from_value(value) {
            Ok(m) => Some(m),
            Err(e) => {
                tracing::debug!("Ignoring malformed stored measurements: {}", e);
                None
            }
        }
    }

    /// Current options-page form values
    pub async fn options(&self) -> OptionsForm {
        OptionsForm {
            enabled: self.is_enabled().await,
            api_url: Some(self.api_url().await),
            measurements: self.get_measurements().await,
        }
    }

    /// Save the options page
    ///
    /// Measurements are kept only when a positive waist is given, otherwise
    /// the stored measurements are cleared.
    pub async fn save_options(&self, form: &OptionsForm) -> Result<(), StorageError> {
        let api_url = form
            .api_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .unwrap_or(&self.default_api_url);

        let mut entries = Map::new();
        entries.insert(KEY_ENABLED.to_string(), json!(form.enabled));
        entries.insert(KEY_API_URL.to_string(), json!(api_url));

        match form.measurements.filter(|m| m.waist_inches > 0.0) {
            Some(m) => {
                entries.insert(KEY_MEASUREMENTS.to_string(), serde_json::to_value(m)?);
                self.storage.set_many(StorageArea::Sync, entries).await
            }
            None => {
                self.storage.set_many(StorageArea::Sync, entries).await?;
                self.storage.remove(StorageArea::Sync, KEY_MEASUREMENTS).await
            }
        }
    }

    /// First-install defaults; existing values are left alone
    pub async fn install_defaults(&self) -> Result<bool, StorageError> {
        let existing = self
            .storage
            .get_many(StorageArea::Sync, &[KEY_ENABLED, KEY_API_URL])
            .await;

        let mut entries = Map::new();
        if !existing.contains_key(KEY_ENABLED) {
            entries.insert(KEY_ENABLED.to_string(), json!(true));
        }
        if !existing.contains_key(KEY_API_URL) {
            entries.insert(KEY_API_URL.to_string(), json!(self.default_api_url));
        }

        if entries.is_empty() {
            return Ok(false);
        }
        self.storage.set_many(StorageArea::Sync, entries).await?;
        Ok(true)
    }

    /// Stored user id, generated and saved on first use
    pub async fn get_or_create_user_id(&self) -> Result<String, StorageError> {
        let value = self
            .storage
            .update(StorageArea::Sync, KEY_USER_ID, |current| match current {
                Some(Value::String(id)) if !id.is_empty() => Value::String(id.clone()),
                _ => Value::String(generate_user_id()),
            })
            .await?;

        Ok(value.as_str().unwrap_or_default().to_string())
    }

    pub async fn get_user_settings(&self) -> UserSettings {
        let value = self.storage.get(StorageArea::Local, KEY_USER_SETTINGS).await;
        shape_user_settings(value.as_ref())
    }

    pub async fn set_user_settings(&self, settings: &UserSettings) -> Result<(), StorageError> {
        self.storage
            .set(StorageArea::Local, KEY_USER_SETTINGS, serde_json::to_value(settings)?)
            .await
    }

    pub async fn reset_user_settings(&self) -> Result<(), StorageError> {
        self.set_user_settings(&UserSettings::default()).await
    }

    pub async fn get_widget_position(&self) -> Option<WidgetPosition> {
        let value = self.storage.get(StorageArea::Local, KEY_WIDGET_POSITION).await;
        shape_widget_position(value.as_ref())
    }

    pub async fn set_widget_position(&self, pos: WidgetPosition) -> Result<(), StorageError> {
        self.storage
            .set(StorageArea::Local, KEY_WIDGET_POSITION, serde_json::to_value(pos)?)
            .await
    }
}

/// `pv_` followed by 13 random lowercase alphanumerics
fn generate_user_id() -> String {
    let raw = uuid::Uuid::new_v4().simple().to_string();
    format!("pv_{}", &raw[..13])
}

/// Shape an arbitrary stored value into well-typed settings
pub fn shape_user_settings(value: Option<&Value>) -> UserSettings {
    let Some(obj) = value.and_then(Value::as_object) else {
        return UserSettings::default();
    };

    let fit_preference = match obj.get("fitPreference").and_then(Value::as_str) {
        Some("fitted") => FitPreference::Fitted,
        Some("relaxed") => FitPreference::Relaxed,
        _ => FitPreference::Regular,
    };

    let raw = obj.get("measurements").and_then(Value::as_object);
    let number = |key: &str| raw.and_then(|m| m.get(key)).and_then(Value::as_f64);

    UserSettings {
        measurements: Measurements {
            bust_in: number("bustIn"),
            waist_in: number("waistIn"),
            hips_in: number("hipsIn"),
        },
        fit_preference,
    }
}

/// A stored position is used only when both axes are finite numbers
pub fn shape_widget_position(value: Option<&Value>) -> Option<WidgetPosition> {
    let obj = value?.as_object()?;
    let left = obj.get("left")?.as_f64()?;
    let top = obj.get("top")?.as_f64()?;

    if left.is_finite() && top.is_finite() {
        Some(WidgetPosition { left, top })
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prefs() -> Preferences {
        Preferences::new(Arc::new(Storage::in_memory()))
    }

    #[test]
    fn test_shape_defaults_on_garbage() {
        let default = UserSettings::default();
        assert_eq!(shape_user_settings(None), default);
        assert_eq!(shape_user_settings(Some(&json!("oops"))), default);
        assert_eq!(shape_user_settings(Some(&json!(42))), default);
        assert_eq!(shape_user_settings(Some(&json!(null))), default);
        assert_eq!(shape_user_settings(Some(&json!([1, 2]))), default);
    }

    #[test]
    fn test_shape_keeps_valid_fields_only() {
        let shaped = shape_user_settings(Some(&json!({
            "measurements": {"bustIn": 36, "waistIn": "29", "hipsIn": 39.5},
            "fitPreference": "baggy"
        })));
        assert_eq!(shaped.measurements.bust_in, Some(36.0));
        assert_eq!(shaped.measurements.waist_in, None);
        assert_eq!(shaped.measurements.hips_in, Some(39.5));
        assert_eq!(shaped.fit_preference, FitPreference::Regular);
    }

    #[test]
    fn test_shape_widget_position() {
        assert_eq!(
            shape_widget_position(Some(&json!({"left": 10, "top": 20.5}))),
            Some(WidgetPosition { left: 10.0, top: 20.5 })
        );
        assert_eq!(shape_widget_position(Some(&json!({"left": 10}))), None);
        assert_eq!(shape_widget_position(Some(&json!({"left": "10", "top": 1}))), None);
        assert_eq!(shape_widget_position(None), None);
    }

    #[tokio::test]
    async fn test_user_settings_round_trip() {
        let prefs = prefs();
        let settings = UserSettings {
            measurements: Measurements { bust_in: Some(34.0), waist_in: Some(28.0), hips_in: None },
            fit_preference: FitPreference::Fitted,
        };
        prefs.set_user_settings(&settings).await.unwrap();
        assert_eq!(prefs.get_user_settings().await, settings);

        prefs.reset_user_settings().await.unwrap();
        assert_eq!(prefs.get_user_settings().await, UserSettings::default());
    }

    #[tokio::test]
    async fn test_enabled_and_api_url_defaults() {
        let prefs = prefs();
        assert!(prefs.is_enabled().await);
        assert_eq!(prefs.api_url().await, DEFAULT_API_URL);

        prefs.storage().set(StorageArea::Sync, KEY_ENABLED, json!(false)).await.unwrap();
        assert!(!prefs.is_enabled().await);
    }

    #[tokio::test]
    async fn test_user_id_is_stable() {
        let prefs = prefs();
        let first = prefs.get_or_create_user_id().await.unwrap();
        let second = prefs.get_or_create_user_id().await.unwrap();
        assert!(first.starts_with("pv_"));
        assert_eq!(first.len(), 16);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_save_options_drops_zero_waist() {
        let prefs = prefs();
        let mut form = OptionsForm {
            enabled: true,
            api_url: Some("  ".into()),
            measurements: Some(UserMeasurements {
                waist_inches: 30.0,
                hip_inches: 40.0,
                chest_inches: None,
                height_inches: None,
            }),
        };
        prefs.save_options(&form).await.unwrap();
        assert_eq!(prefs.api_url().await, DEFAULT_API_URL);
        assert_eq!(prefs.get_measurements().await.map(|m| m.hip_inches), Some(40.0));

        form.measurements = form.measurements.map(|m| UserMeasurements { waist_inches: 0.0, ..m });
        prefs.save_options(&form).await.unwrap();
        assert!(prefs.get_measurements().await.is_none());
    }

    #[tokio::test]
    async fn test_install_defaults_only_once() {
        let prefs = prefs();
        assert!(prefs.install_defaults().await.unwrap());
        assert!(!prefs.install_defaults().await.unwrap());
    }

    #[tokio::test]
    async fn test_clear_all_restores_defaults() {
        let prefs = prefs();
        prefs.install_defaults().await.unwrap();
        prefs.storage().set(StorageArea::Sync, KEY_ENABLED, json!(false)).await.unwrap();
        prefs.set_widget_position(WidgetPosition { left: 20.0, top: 30.0 }).await.unwrap();
        let user_id = prefs.get_or_create_user_id().await.unwrap();

        prefs.clear_all().await.unwrap();

        assert!(prefs.is_enabled().await);
        assert_eq!(prefs.api_url().await, DEFAULT_API_URL);
        assert!(prefs.get_widget_position().await.is_none());
        assert_ne!(prefs.get_or_create_user_id().await.unwrap(), user_id);
    }
}
