//! `-Q` mode — show the current indicator state.

use super::{
    BackendArgs, BackendError, Led, LedMask, QueryOutput, Result, kv, kv_width, lit_names,
    open_backend, print_json,
};

pub(super) fn cmd_query(backend: &BackendArgs, json: bool) -> Result<()> {
    let led_backend = open_backend(backend)?;
    if !led_backend.can_query() {
        return Err(BackendError::QueryUnsupported(led_backend.name()).into());
    }
    let mask = led_backend.query()?;
    let output = QueryOutput {
        backend: led_backend.name(),
        device: backend.target(),
        mask,
        scroll: mask.is_lit(Led::Scroll),
        num: mask.is_lit(Led::Num),
        caps: mask.is_lit(Led::Caps),
    };
    if json {
        print_json(&output)
    } else {
        print_query(&output, mask);
        Ok(())
    }
}

fn on_off(lit: bool) -> &'static str {
    if lit { "on" } else { "off" }
}

fn print_query(output: &QueryOutput, mask: LedMask) {
    let w = kv_width(&["Device:", "Scroll Lock:", "Num Lock:", "Caps Lock:", "Mask:"]);
    kv("Device:", &output.device, w);
    kv("Scroll Lock:", on_off(output.scroll), w);
    kv("Num Lock:", on_off(output.num), w);
    kv("Caps Lock:", on_off(output.caps), w);
    kv("Mask:", format!("{mask} ({})", lit_names(mask)), w);
}
