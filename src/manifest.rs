// src/manifest.rs

//! AndroidManifest.xml generation.
//!
//! The `[manifest]` config section describes the app; [`render`] turns it
//! into a launcher-ready manifest and [`manifest_payload`] writes it to disk
//! as a scheduled task.

use std::io;
use std::path::PathBuf;

use anyhow::Context;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use serde::Deserialize;
use tracing::{debug, info};

use crate::exec::Payload;

pub const ANDROID_NS: &str = "http://schemas.android.com/apk/res/android";

/// `[manifest]` section.
///
/// ```toml
/// [manifest]
/// package = "com.example.myapp"
/// app_name = "My Awesome App"
/// icon = "ic_launcher"
/// main_activity = ".MainActivity"
/// permissions = ["ACCESS_FINE_LOCATION", "POST_NOTIFICATIONS"]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ManifestSpec {
    pub package: String,

    pub app_name: String,

    /// Mipmap resource name, or a full `@drawable/...` style reference.
    #[serde(default = "default_icon")]
    pub icon: String,

    pub main_activity: String,

    /// Bare names (`CAMERA`) are qualified as `android.permission.CAMERA`.
    #[serde(default)]
    pub permissions: Vec<String>,
}

fn default_icon() -> String {
    "ic_launcher".to_string()
}

impl ManifestSpec {
    pub fn new(
        package: impl Into<String>,
        app_name: impl Into<String>,
        main_activity: impl Into<String>,
    ) -> Self {
        Self {
            package: package.into(),
            app_name: app_name.into(),
            icon: default_icon(),
            main_activity: main_activity.into(),
            permissions: Vec::new(),
        }
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }

    pub fn with_permission(mut self, permission: impl Into<String>) -> Self {
        self.permissions.push(permission.into());
        self
    }

    /// Resource reference for `android:icon`.
    pub fn icon_ref(&self) -> String {
        if self.icon.starts_with('@') {
            self.icon.clone()
        } else {
            format!("@mipmap/{}", self.icon)
        }
    }

    /// Fully qualified permission names, duplicates dropped, in config order.
    pub fn qualified_permissions(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::with_capacity(self.permissions.len());
        for permission in &self.permissions {
            let permission = permission.trim();
            let qualified = if permission.contains('.') {
                permission.to_string()
            } else {
                format!("android.permission.{permission}")
            };
            if !out.contains(&qualified) {
                out.push(qualified);
            }
        }
        out
    }
}

/// Render the manifest document.
///
/// The main activity is exported with a MAIN/LAUNCHER intent filter so the
/// app can be started on a device.
pub fn render(spec: &ManifestSpec) -> io::Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 4);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut manifest = BytesStart::new("manifest");
    manifest.push_attribute(("xmlns:android", ANDROID_NS));
    manifest.push_attribute(("package", spec.package.as_str()));
    writer.write_event(Event::Start(manifest))?;

    for permission in spec.qualified_permissions() {
        let mut uses = BytesStart::new("uses-permission");
        uses.push_attribute(("android:name", permission.as_str()));
        writer.write_event(Event::Empty(uses))?;
    }

    let icon = spec.icon_ref();
    let mut application = BytesStart::new("application");
    application.push_attribute(("android:label", spec.app_name.as_str()));
    application.push_attribute(("android:icon", icon.as_str()));
    writer.write_event(Event::Start(application))?;

    let mut activity = BytesStart::new("activity");
    activity.push_attribute(("android:name", spec.main_activity.as_str()));
    activity.push_attribute(("android:exported", "true"));
    writer.write_event(Event::Start(activity))?;

    writer.write_event(Event::Start(BytesStart::new("intent-filter")))?;
    let mut action = BytesStart::new("action");
    action.push_attribute(("android:name", "android.intent.action.MAIN"));
    writer.write_event(Event::Empty(action))?;
    let mut category = BytesStart::new("category");
    category.push_attribute(("android:name", "android.intent.category.LAUNCHER"));
    writer.write_event(Event::Empty(category))?;
    writer.write_event(Event::End(BytesEnd::new("intent-filter")))?;

    writer.write_event(Event::End(BytesEnd::new("activity")))?;
    writer.write_event(Event::End(BytesEnd::new("application")))?;
    writer.write_event(Event::End(BytesEnd::new("manifest")))?;

    let mut xml = String::from_utf8(writer.into_inner())
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    xml.push('\n');

    debug!(package = %spec.package, bytes = xml.len(), "rendered manifest");
    Ok(xml)
}

/// Payload that renders `spec` and writes it to `path`, creating parent
/// directories. Its value is the path written.
pub fn manifest_payload(spec: ManifestSpec, path: impl Into<PathBuf>) -> Payload {
    let path = path.into();
    Payload::new(move || async move {
        let xml = render(&spec).context("failed to render manifest")?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        tokio::fs::write(&path, xml)
            .await
            .with_context(|| format!("failed to write {}", path.display()))?;

        info!(package = %spec.package, path = %path.display(), "manifest written");
        Ok(path.display().to_string())
    })
}
