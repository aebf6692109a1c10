//! `--photo symptom=source` arguments.
//!
//! A source starting with `http` is kept as a link; anything else is read as
//! a local file and inlined as a base64 `data:` URL.

use std::{collections::BTreeMap, path::Path};

use anyhow::{Context as _, bail};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};

/// Split `symptom=source` at the first `=`.
pub fn parse_arg(arg: &str) -> anyhow::Result<(String, String)> {
  let Some((symptom, source)) = arg.split_once('=') else {
    bail!("expected SYMPTOM=PATH_OR_URL, got {arg:?}");
  };
  let symptom = symptom.trim();
  if symptom.is_empty() {
    bail!("photo argument {arg:?} names no symptom");
  }
  Ok((symptom.to_owned(), source.trim().to_owned()))
}

fn mime_type(path: &Path) -> &'static str {
  let ext = path
    .extension()
    .and_then(|e| e.to_str())
    .map(str::to_ascii_lowercase);
  match ext.as_deref() {
    Some("png") => "image/png",
    Some("jpg" | "jpeg") => "image/jpeg",
    Some("gif") => "image/gif",
    Some("webp") => "image/webp",
    Some("heic") => "image/heic",
    _ => "application/octet-stream",
  }
}

fn data_url(mime: &str, bytes: &[u8]) -> String {
  format!("data:{mime};base64,{}", B64.encode(bytes))
}

/// Resolve one source to the raw photo value handed to the store.
fn load(source: &str) -> anyhow::Result<String> {
  if source.is_empty() || source.starts_with("http") || source.starts_with("data:") {
    return Ok(source.to_owned());
  }
  let path = Path::new(source);
  let bytes = std::fs::read(path).with_context(|| format!("failed to read photo {source}"))?;
  tracing::debug!(path = %path.display(), bytes = bytes.len(), "inlining photo");
  Ok(data_url(mime_type(path), &bytes))
}

/// Build the symptom → photo map from every `--photo` argument. Later
/// arguments for the same symptom win.
pub fn collect(args: &[String]) -> anyhow::Result<Option<BTreeMap<String, String>>> {
  if args.is_empty() {
    return Ok(None);
  }
  let mut photos = BTreeMap::new();
  for arg in args {
    let (symptom, source) = parse_arg(arg)?;
    photos.insert(symptom, load(&source)?);
  }
  Ok(Some(photos))
}
