use super::DosingPolicy;

/// Fixed dose every step, no memory.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantDose {
    dose: f64,
    name: &'static str,
}

impl ConstantDose {
    pub fn new(dose: f64, name: &'static str) -> Self {
        Self { dose, name }
    }

    /// Maximum tolerated dose: 1.0 every step.
    pub fn max() -> Self {
        Self::new(1.0, "mtd")
    }

    /// Metronomic therapy: 0.4 every step.
    pub fn low() -> Self {
        Self::new(0.4, "metronomic")
    }

    pub fn dose(&self) -> f64 {
        self.dose
    }
}

impl<O: ?Sized> DosingPolicy<O> for ConstantDose {
    type Memory = ();

    fn name(&self) -> &str {
        self.name
    }

    fn decide(&self, _observation: &O, _step: usize, _memory: &mut ()) -> f64 {
        self.dose
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::testing::Burden;

    #[test]
    fn test_constant_doses() {
        let obs = Burden(0.3);
        assert_eq!(ConstantDose::max().decide(&obs, 0, &mut ()), 1.0);
        assert_eq!(ConstantDose::low().decide(&obs, 99, &mut ()), 0.4);
    }
}
