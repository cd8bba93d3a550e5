//! End-to-end harness tests: a small linear few-shot scorer trained on
//! synthetic separable data through the public API.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use relatar::autograd::ops;
use relatar::{
    Batch, Checkpoint, DataLoader, Episode, EvalConfig, FewShotModel, Framework, Result,
    TrainConfig, Tensor,
};

const DIM: usize = 4;

/// Synthetic loader: instances are random feature vectors, the label is 1
/// when the feature sum is positive. Linearly separable, so a linear scorer
/// can learn it quickly.
struct SyntheticLoader {
    rng: StdRng,
}

impl SyntheticLoader {
    fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn make_batch(&mut self, size: usize) -> Batch {
        let mut inputs = Vec::with_capacity(size * DIM);
        let mut labels = Vec::with_capacity(size);
        for _ in 0..size {
            let features: Vec<f32> = (0..DIM).map(|_| self.rng.gen_range(-1.0..1.0)).collect();
            let sum: f32 = features.iter().sum();
            labels.push(if sum > 0.0 { 1.0 } else { 0.0 });
            inputs.extend_from_slice(&features);
        }
        Batch::new(Tensor::from_vec(inputs, false), Tensor::from_vec(labels, false))
    }
}

impl DataLoader for SyntheticLoader {
    fn next_batch(&mut self, batch_size: usize) -> Result<Batch> {
        Ok(self.make_batch(batch_size))
    }

    fn next_new_relation(
        &mut self,
        _reference: &mut Self,
        support_size: usize,
        query_size: usize,
        _query_class: usize,
    ) -> Result<Episode> {
        let support = self.make_batch(support_size);
        let query = self.make_batch(query_size);
        Ok(Episode::new(support, query))
    }
}

/// Linear scorer: p = σ(w · x + b), one parameter vector and a bias.
struct LinearModel {
    weight: Tensor,
    bias: Tensor,
    loss: Tensor,
    accuracy: f32,
}

impl LinearModel {
    fn new() -> Self {
        Self {
            weight: Tensor::zeros(DIM, true),
            bias: Tensor::zeros(1, true),
            loss: Tensor::from_vec(vec![0.0], false),
            accuracy: 0.0,
        }
    }

    /// Score every instance in the batch, then set loss (mean BCE over the
    /// per-instance losses, still on the tape) and thresholded accuracy.
    fn score_batch(&mut self, batch: &Batch) {
        let inputs = batch.inputs.data();
        let labels = batch.labels.data();
        let n = batch.size();

        let mut loss_sum: Option<Tensor> = None;
        let mut correct = 0usize;

        for i in 0..n {
            let features: Vec<f32> = inputs.slice(ndarray::s![i * DIM..(i + 1) * DIM]).to_vec();
            let x = Tensor::from_vec(features, false);

            let logit = ops::add(&ops::sum(&ops::mul(&self.weight, &x)), &self.bias);
            let prob = ops::sigmoid(&logit);
            let label = Tensor::from_vec(vec![labels[i]], false);

            if (prob.item() >= 0.5) == (labels[i] >= 0.5) {
                correct += 1;
            }

            let instance_loss = self.compute_loss(&prob, &label);
            loss_sum = Some(match loss_sum {
                Some(acc) => ops::add(&acc, &instance_loss),
                None => instance_loss,
            });
        }

        let total = loss_sum.unwrap_or_else(|| Tensor::from_vec(vec![0.0], false));
        self.loss = ops::scale(&total, 1.0 / n.max(1) as f32);
        self.accuracy = correct as f32 / n.max(1) as f32;
    }
}

impl FewShotModel for LinearModel {
    fn forward_base(&mut self, batch: &Batch) -> Result<()> {
        self.score_batch(batch);
        Ok(())
    }

    fn forward_new(&mut self, episode: &Episode) -> Result<()> {
        // Score the query set with the current parameters; the support set
        // is not used by this deliberately simple scorer.
        self.score_batch(&episode.query);
        Ok(())
    }

    fn loss(&self) -> Tensor {
        self.loss.clone()
    }

    fn accuracy(&self) -> f32 {
        self.accuracy
    }

    fn parameters(&self) -> Vec<Tensor> {
        vec![self.weight.clone(), self.bias.clone()]
    }

    fn state_dict(&self) -> Vec<(String, Tensor)> {
        vec![
            ("weight".to_string(), self.weight.clone()),
            ("bias".to_string(), self.bias.clone()),
        ]
    }
}

fn config(dir: &std::path::Path) -> TrainConfig {
    TrainConfig::new("linear")
        .ckpt_dir(dir)
        .batch_size(16)
        .learning_rate(0.5)
        .lr_step_size(1_000)
        .weight_decay(0.0)
        .train_iter(80)
        .val_step(20)
        .val_iter(5)
        .test_iter(10)
        .episode_shape(4, 8, 2)
}

#[test]
fn training_learns_the_separable_task() {
    let dir = tempfile::tempdir().unwrap();
    let mut framework = Framework::new(
        SyntheticLoader::new(1),
        SyntheticLoader::new(2),
        SyntheticLoader::new(3),
    );
    let mut model = LinearModel::new();

    let test_acc = framework.train(&mut model, &config(dir.path())).unwrap();

    // A linear scorer on linearly separable data should beat chance by a
    // clear margin after 80 iterations.
    assert!(test_acc > 0.7, "test accuracy {test_acc} too low");
    assert!(test_acc <= 1.0);

    // The weight vector should point in the direction of the feature sum.
    assert!(model.weight.data().iter().all(|&w| w > 0.0));
}

#[test]
fn training_persists_a_loadable_best_checkpoint() {
    let dir = tempfile::tempdir().unwrap();
    let mut framework = Framework::new(
        SyntheticLoader::new(10),
        SyntheticLoader::new(11),
        SyntheticLoader::new(12),
    );
    let mut model = LinearModel::new();

    framework.train(&mut model, &config(dir.path())).unwrap();

    let path = dir.path().join("linear.ckpt.json");
    let ckpt = Checkpoint::load(&path).unwrap();
    assert_eq!(ckpt.state_dict.len(), 2);
    assert!(ckpt.iter < 80);

    // Restoring into a fresh model reproduces the saved accuracy profile.
    let mut restored = LinearModel::new();
    ckpt.restore(&mut restored).unwrap();
    let acc = framework
        .eval(&mut restored, &EvalConfig::default().eval_iter(10).episode_shape(4, 8, 2))
        .unwrap();
    assert!(acc > 0.6, "restored model accuracy {acc} too low");
}

#[test]
fn eval_with_missing_checkpoint_aborts() {
    let dir = tempfile::tempdir().unwrap();
    let mut framework = Framework::new(
        SyntheticLoader::new(20),
        SyntheticLoader::new(21),
        SyntheticLoader::new(22),
    );
    let mut model = LinearModel::new();

    let result = framework.eval(
        &mut model,
        &EvalConfig::default().ckpt(dir.path().join("missing.ckpt.json")),
    );
    assert!(result.is_err());
}

#[test]
fn warm_start_resumes_past_saved_iteration() {
    let dir = tempfile::tempdir().unwrap();
    let mut framework = Framework::new(
        SyntheticLoader::new(30),
        SyntheticLoader::new(31),
        SyntheticLoader::new(32),
    );

    let mut first = LinearModel::new();
    framework.train(&mut first, &config(dir.path())).unwrap();
    let first_ckpt = Checkpoint::load(dir.path().join("linear.ckpt.json")).unwrap();

    // Warm-start a second run from the first run's checkpoint.
    let warm_dir = tempfile::tempdir().unwrap();
    let mut second = LinearModel::new();
    let warm_config = config(warm_dir.path())
        .train_iter(20)
        .pretrain_ckpt(dir.path().join("linear.ckpt.json"));
    framework.train(&mut second, &warm_config).unwrap();

    // Iteration numbering continued from the saved index, so the new best
    // checkpoint carries a later iteration.
    let second_ckpt = Checkpoint::load(warm_dir.path().join("linear.ckpt.json")).unwrap();
    assert!(second_ckpt.iter > first_ckpt.iter);
}
