/// Represents an autonomous or time-dependent system of ODEs.
///
/// Implementations must be `Sync` to be integrated across a batch in parallel.
pub trait DynamicalSystem {
    /// Returns the dimension of the state space.
    fn dimension(&self) -> usize;

    /// Evaluates the vector field.
    /// t: current time
    /// x: current state
    /// out: buffer to write dx/dt into
    fn apply(&self, t: f64, x: &[f64], out: &mut [f64]);
}

impl<S: DynamicalSystem + ?Sized> DynamicalSystem for &S {
    fn dimension(&self) -> usize {
        (**self).dimension()
    }

    fn apply(&self, t: f64, x: &[f64], out: &mut [f64]) {
        (**self).apply(t, x, out)
    }
}
