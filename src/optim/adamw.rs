//! AdamW optimizer (Adam with decoupled weight decay)

use super::Optimizer;
use crate::Tensor;
use ndarray::Array1;

/// AdamW optimizer.
///
/// Weight decay is applied directly to the parameters rather than folded
/// into the gradient:
/// ```text
/// θ_t = (1 - lr * λ) * θ_{t-1} - lr * m̂_t / (√v̂_t + ε)
/// ```
pub struct AdamW {
    lr: f32,
    beta1: f32,
    beta2: f32,
    epsilon: f32,
    weight_decay: f32,
    t: u64,
    m: Vec<Option<Array1<f32>>>,
    v: Vec<Option<Array1<f32>>>,
}

impl AdamW {
    /// Create a new AdamW optimizer.
    pub fn new(lr: f32, beta1: f32, beta2: f32, epsilon: f32, weight_decay: f32) -> Self {
        Self {
            lr,
            beta1,
            beta2,
            epsilon,
            weight_decay,
            t: 0,
            m: Vec::new(),
            v: Vec::new(),
        }
    }

    /// AdamW with the usual betas and epsilon.
    pub fn default_params(lr: f32, weight_decay: f32) -> Self {
        Self::new(lr, 0.9, 0.999, 1e-8, weight_decay)
    }

    fn ensure_moments(&mut self, params: &[Tensor]) {
        if self.m.len() != params.len() {
            self.m = params.iter().map(|_| None).collect();
            self.v = params.iter().map(|_| None).collect();
        }
    }
}

impl Optimizer for AdamW {
    fn step(&mut self, params: &[Tensor]) {
        self.ensure_moments(params);
        self.t += 1;

        let bias1 = 1.0 - self.beta1.powi(self.t as i32);
        let bias2 = 1.0 - self.beta2.powi(self.t as i32);

        for (i, param) in params.iter().enumerate() {
            let Some(grad) = param.grad() else { continue };

            let m = match self.m[i].take() {
                Some(prev) => prev * self.beta1 + &grad * (1.0 - self.beta1),
                None => &grad * (1.0 - self.beta1),
            };
            let v = match self.v[i].take() {
                Some(prev) => prev * self.beta2 + grad.mapv(|g| g * g) * (1.0 - self.beta2),
                None => grad.mapv(|g| g * g) * (1.0 - self.beta2),
            };

            let m_hat = &m / bias1;
            let v_hat = &v / bias2;

            let decayed = param.data() * (1.0 - self.lr * self.weight_decay);
            let eps = self.epsilon;
            let update = m_hat
                .iter()
                .zip(v_hat.iter())
                .map(|(&mh, &vh)| self.lr * mh / (vh.sqrt() + eps))
                .collect::<Array1<f32>>();
            param.set_data(decayed - update);

            self.m[i] = Some(m);
            self.v[i] = Some(v);
        }
    }

    fn lr(&self) -> f32 {
        self.lr
    }

    fn set_lr(&mut self, lr: f32) {
        self.lr = lr;
    }
}
