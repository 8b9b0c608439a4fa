//! Translation of Bladed dimension codes (`VARUNIT`, `AXIUNIT`) to SI units.
//!
//! A code is a product of base letters, optionally divided by a second
//! product: `FL` is force times length, `A/T` angle per time, `L/TT`
//! acceleration. Repeated letters are powers.

use std::collections::BTreeMap;

fn base_unit(letter: char) -> Option<&'static str> {
    let unit = match letter {
        'F' => "N",
        'L' => "m",
        'M' => "kg",
        'T' => "s",
        'A' => "rad",
        'P' => "W",
        'I' => "A",
        'V' => "V",
        'K' => "K",
        _ => return None,
    };
    Some(unit)
}

/// Renders one product of letters, e.g. `FLL` → `N m^2`.
fn product(letters: &str) -> Option<String> {
    // Keep first-seen order for readable output.
    let mut order = Vec::new();
    let mut powers: BTreeMap<char, u32> = BTreeMap::new();
    for c in letters.chars() {
        base_unit(c)?;
        if !powers.contains_key(&c) {
            order.push(c);
        }
        *powers.entry(c).or_insert(0) += 1;
    }
    let parts: Vec<String> = order
        .iter()
        .filter_map(|c| {
            let unit = base_unit(*c)?;
            Some(match powers[c] {
                1 => unit.to_string(),
                p => format!("{}^{}", unit, p),
            })
        })
        .collect();
    Some(parts.join(" "))
}

/// Converts a dimension code into an SI unit string.
///
/// `N` is dimensionless and maps to `-`. Returns `None` for text that is not
/// a dimension code (free-form units such as `kNm` are kept verbatim by the
/// reader and simply have no translation).
pub fn si_unit(code: &str) -> Option<String> {
    let code = code.trim();
    if code == "N" {
        return Some("-".to_string());
    }
    if code.is_empty() {
        return None;
    }
    match code.split_once('/') {
        Some((num, den)) if !den.is_empty() && !den.contains('/') => {
            let denominator = product(den)?;
            let numerator = if num.is_empty() { "1".to_string() } else { product(num)? };
            if denominator.contains(' ') {
                Some(format!("{}/({})", numerator, denominator))
            } else {
                Some(format!("{}/{}", numerator, denominator))
            }
        }
        Some(_) => None,
        None => product(code),
    }
}
