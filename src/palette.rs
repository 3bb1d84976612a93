/// `count` evenly spaced hues as CSS `hsl()` colours.
pub fn generate_palette(count: usize) -> Vec<String> {
    if count == 0 {
        return Vec::new();
    }
    let step = 360.0 / count as f64;
    (0..count)
        .map(|i| format!("hsl({}, 70%, 60%)", (step * i as f64).round() as u32))
        .collect()
}
