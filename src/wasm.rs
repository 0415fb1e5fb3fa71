use wasm_bindgen::prelude::*;

use crate::config::FolioConfig;

/// Paginate `html` and return the `PaginationResult` as a JS object.
///
/// `config` is an optional JSON string in the same shape as a config file.
#[wasm_bindgen(js_name = paginateHtml)]
pub fn paginate_html(html: &str, css: &str, config: Option<String>) -> Result<JsValue, JsValue> {
    let config = match config.as_deref() {
        Some(json) => FolioConfig::from_json(json).map_err(|e| JsValue::from_str(&e.to_string()))?,
        None => FolioConfig::default(),
    };
    let result = crate::paginate_html(html, css, &config)
        .map_err(|e| JsValue::from_str(&format!("Pagination failed: {}", e)))?;
    serde_wasm_bindgen::to_value(&result).map_err(|e| js_sys::Error::new(&e.to_string()).into())
}
