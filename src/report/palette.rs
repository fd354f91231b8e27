use std::fmt::Display;

use serde::{Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Display for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.0, self.1, self.2)
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

struct HueBand {
    h_min: f64,
    h_max: f64,
    s: f64,
    l: f64,
}

const fn band(h_min: f64, h_max: f64, s: f64, l: f64) -> HueBand {
    HueBand { h_min, h_max, s, l }
}

/// Widely separated hue families. Slot 0 is the neutral one, kept for unassigned time.
const PALETTE_BANDS: [HueBand; 13] = [
    band(0., 360., 0.00, 0.60),   // gray
    band(210., 230., 0.70, 0.52), // blue
    band(35., 45., 0.85, 0.50),   // amber
    band(95., 110., 0.70, 0.48),  // lime
    band(270., 290., 0.60, 0.52), // purple
    band(310., 330., 0.65, 0.52), // magenta
    band(50., 60., 0.90, 0.46),   // yellow
    band(335., 350., 0.65, 0.52), // pink
    band(170., 185., 0.65, 0.50), // teal
    band(120., 135., 0.65, 0.50), // green
    band(190., 205., 0.70, 0.48), // cyan
    band(235., 255., 0.65, 0.52), // indigo
    band(20., 30., 0.80, 0.50),   // orange
];

const LIGHTNESS_STEPS: [f64; 3] = [-0.07, 0.0, 0.06];

fn fnv1a32(bytes: &[u8]) -> u32 {
    bytes.iter().fold(0x811c_9dc5, |hash: u32, byte| {
        (hash ^ *byte as u32).wrapping_mul(0x0100_0193)
    })
}

/// Color of the task in `slot`. The slot picks the hue band, the name picks the exact hue and
/// lightness inside it, so the result only depends on `(slot, name)`.
pub fn task_color(slot: usize, task_name: &str) -> Rgb {
    let hash = fnv1a32(task_name.as_bytes());
    let band = &PALETTE_BANDS[slot % PALETTE_BANDS.len()];

    let inner = ((hash >> 8) % 1000) as f64 / 1000.;
    let hue = band.h_min + inner * (band.h_max - band.h_min);
    let step = LIGHTNESS_STEPS[((hash >> 18) % LIGHTNESS_STEPS.len() as u32) as usize];
    let lightness = (band.l + step).clamp(0., 1.);

    hsl_to_rgb(hue / 360., band.s, lightness)
}

fn hsl_to_rgb(h: f64, s: f64, l: f64) -> Rgb {
    if s == 0. {
        let v = (l * 255.) as u8;
        return Rgb(v, v, v);
    }
    let q = if l < 0.5 { l * (1. + s) } else { l + s - l * s };
    let p = 2. * l - q;
    let channel = |t: f64| (hue_to_rgb(p, q, t) * 255. + 0.5) as u8;
    Rgb(channel(h + 1. / 3.), channel(h), channel(h - 1. / 3.))
}

fn hue_to_rgb(p: f64, q: f64, mut t: f64) -> f64 {
    if t < 0. {
        t += 1.;
    }
    if t > 1. {
        t -= 1.;
    }
    if t < 1. / 6. {
        p + (q - p) * 6. * t
    } else if t < 1. / 2. {
        q
    } else if t < 2. / 3. {
        p + (q - p) * (2. / 3. - t) * 6.
    } else {
        p
    }
}

const RAMP_RED: Rgb = Rgb(220, 60, 60);
const RAMP_YELLOW: Rgb = Rgb(235, 190, 50);
const RAMP_GREEN: Rgb = Rgb(60, 180, 90);
const RAMP_PEAK: Rgb = Rgb(20, 180, 45);

/// Red at 0%, yellow at 50%, green at 75% and deep green at 100%.
pub fn activity_color(percent: f64) -> Rgb {
    let t = (percent / 100.).clamp(0., 1.);
    if t <= 0.5 {
        lerp(RAMP_RED, RAMP_YELLOW, t * 2.)
    } else if t <= 0.75 {
        lerp(RAMP_YELLOW, RAMP_GREEN, (t - 0.5) * 4.)
    } else {
        lerp(RAMP_GREEN, RAMP_PEAK, (t - 0.75) * 4.)
    }
}

fn lerp(from: Rgb, to: Rgb, t: f64) -> Rgb {
    let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t + 0.5) as u8;
    Rgb(mix(from.0, to.0), mix(from.1, to.1), mix(from.2, to.2))
}

#[cfg(test)]
mod tests {
    use super::{activity_color, fnv1a32, task_color, Rgb};

    #[test]
    fn fnv_matches_reference_values() {
        assert_eq!(fnv1a32(b""), 0x811c9dc5);
        assert_eq!(fnv1a32(b"a"), 0xe40c292c);
        assert_eq!(fnv1a32(b"foobar"), 0xbf9cf968);
    }

    #[test]
    fn colors_are_deterministic() {
        for slot in 0..20 {
            assert_eq!(task_color(slot, "Review"), task_color(slot, "Review"));
        }
        assert_eq!(task_color(1, "Review"), task_color(14, "Review"));
        assert_ne!(task_color(1, "Review"), task_color(2, "Review"));
    }

    #[test]
    fn slot_zero_is_gray() {
        let Rgb(r, g, b) = task_color(0, "Unassigned Time");
        assert_eq!(r, g);
        assert_eq!(g, b);
    }

    #[test]
    fn activity_ramp_endpoints() {
        assert_eq!(activity_color(0.), Rgb(220, 60, 60));
        assert_eq!(activity_color(50.), Rgb(235, 190, 50));
        assert_eq!(activity_color(75.), Rgb(60, 180, 90));
        assert_eq!(activity_color(100.), Rgb(20, 180, 45));
        assert_eq!(activity_color(250.), Rgb(20, 180, 45));
        assert_eq!(activity_color(-3.), Rgb(220, 60, 60));
    }

    #[test]
    fn hex_format() {
        assert_eq!(Rgb(10, 255, 0).to_string(), "#0AFF00");
    }
}
