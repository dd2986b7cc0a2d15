use std::fmt;

/// Complex impedance in ohms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Impedance {
    pub real: f64,
    pub imaginary: f64,
}

impl Impedance {
    pub fn new(real: f64, imaginary: f64) -> Self {
        Self { real, imaginary }
    }

    /// Absolute value in ohms.
    pub fn magnitude(&self) -> f64 {
        self.real.hypot(self.imaginary)
    }

    /// Phase angle in radians, in `(-pi, pi]`.
    pub fn phase(&self) -> f64 {
        self.imaginary.atan2(self.real)
    }
}

impl fmt::Display for Impedance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ohm, {} rad", self.magnitude(), self.phase())
    }
}
