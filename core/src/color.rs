//! Temperature-to-colour gradients for supply and return water.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// CSS functional notation, e.g. `rgb(59,130,246)`.
    #[must_use]
    pub fn css(self) -> String {
        self.to_string()
    }
}

impl std::fmt::Display for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "rgb({},{},{})", self.r, self.g, self.b)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorStop {
    /// °F.
    pub temp: f64,
    pub color: Rgb,
}

impl ColorStop {
    #[must_use]
    pub const fn new(temp: f64, color: Rgb) -> Self {
        Self { temp, color }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum GradientError {
    #[error("a gradient needs at least two stops, got {0}")]
    TooFewStops(usize),
    #[error("stop {index} has a non-finite temperature")]
    NonFinite { index: usize },
    #[error("stop {index} at {temp} does not increase over the previous stop")]
    NotIncreasing { index: usize, temp: f64 },
}

/// Piecewise-linear colour ramp over strictly increasing temperatures.
///
/// Outside the stop range the first or last colour is returned unchanged.
/// At a stop temperature the stop's own colour is reproduced exactly, so
/// the ramp is continuous across segment boundaries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gradient<'a> {
    stops: &'a [ColorStop],
}

const SUPPLY_STOPS: [ColorStop; 6] = [
    ColorStop::new(40.0, Rgb::new(255, 255, 255)),
    ColorStop::new(45.0, Rgb::new(56, 189, 248)),
    ColorStop::new(60.0, Rgb::new(6, 182, 212)),
    ColorStop::new(90.0, Rgb::new(59, 130, 246)),
    ColorStop::new(105.0, Rgb::new(249, 115, 22)),
    ColorStop::new(120.0, Rgb::new(239, 68, 68)),
];

const RETURN_STOPS: [ColorStop; 4] = [
    ColorStop::new(60.0, Rgb::new(59, 130, 246)),
    ColorStop::new(75.0, Rgb::new(249, 115, 22)),
    ColorStop::new(86.0, Rgb::new(239, 68, 68)),
    ColorStop::new(113.0, Rgb::new(153, 27, 27)),
];

/// Basin (supply) water, 40-120 °F.
pub const SUPPLY_GRADIENT: Gradient<'static> = Gradient {
    stops: &SUPPLY_STOPS,
};

/// Return water, 60-113 °F.
pub const RETURN_GRADIENT: Gradient<'static> = Gradient {
    stops: &RETURN_STOPS,
};

impl<'a> Gradient<'a> {
    pub fn new(stops: &'a [ColorStop]) -> Result<Self, GradientError> {
        if stops.len() < 2 {
            return Err(GradientError::TooFewStops(stops.len()));
        }
        for (index, stop) in stops.iter().enumerate() {
            if !stop.temp.is_finite() {
                return Err(GradientError::NonFinite { index });
            }
            if index > 0 && stop.temp <= stops[index - 1].temp {
                return Err(GradientError::NotIncreasing {
                    index,
                    temp: stop.temp,
                });
            }
        }
        Ok(Self { stops })
    }

    #[must_use]
    pub fn stops(&self) -> &'a [ColorStop] {
        self.stops
    }

    /// Colour at temperature `t`. NaN samples as the coldest stop.
    #[must_use]
    pub fn sample(&self, t: f64) -> Rgb {
        let (first, last) = match (self.stops.first(), self.stops.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Rgb::new(0, 0, 0),
        };
        if t.is_nan() || t <= first.temp {
            return first.color;
        }
        if t >= last.temp {
            return last.color;
        }

        for pair in self.stops.windows(2) {
            let (lo, hi) = (&pair[0], &pair[1]);
            if t >= lo.temp && t <= hi.temp {
                let factor = (t - lo.temp) / (hi.temp - lo.temp);
                return Rgb::new(
                    lerp_channel(lo.color.r, hi.color.r, factor),
                    lerp_channel(lo.color.g, hi.color.g, factor),
                    lerp_channel(lo.color.b, hi.color.b, factor),
                );
            }
        }
        last.color
    }
}

fn lerp_channel(from: u8, to: u8, factor: f64) -> u8 {
    let from = f64::from(from);
    let to = f64::from(to);
    (from + (to - from) * factor).round().clamp(0.0, 255.0) as u8
}
