/// Risk evaluation for scored readings.
///
/// Submodules:
/// - `risk`: probability → BAIXO / MÉDIO / ALTO tier with advisory text

pub mod risk;
