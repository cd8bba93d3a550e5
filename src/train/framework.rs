//! The training/evaluation framework

use super::checkpoint::Checkpoint;
use super::config::{EvalConfig, OptimizerKind, TrainConfig};
use super::metrics::RunningAverage;
use super::progress::ProgressLine;
use crate::autograd::backward;
use crate::data::DataLoader;
use crate::error::Result;
use crate::model::FewShotModel;
use crate::optim::{AdamW, LRScheduler, Optimizer, StepDecayLR, SGD};
use crate::Tensor;

/// Orchestrates training, periodic validation, best-checkpoint persistence,
/// and the final test pass.
///
/// Owns one data loader per phase. Everything runs single-threaded and
/// blocking: an iteration's forward pass, backward pass, and optimizer step
/// complete before the next iteration begins.
pub struct Framework<L: DataLoader> {
    train_loader: L,
    val_loader: L,
    test_loader: L,
    progress: ProgressLine,
}

impl<L: DataLoader> Framework<L> {
    pub fn new(train_loader: L, val_loader: L, test_loader: L) -> Self {
        Self {
            train_loader,
            val_loader,
            test_loader,
            progress: ProgressLine::stdout(),
        }
    }

    #[cfg(test)]
    fn silent(train_loader: L, val_loader: L, test_loader: L) -> Self {
        Self {
            train_loader,
            val_loader,
            test_loader,
            progress: ProgressLine::sink(),
        }
    }

    /// Run the full training procedure and return the final test accuracy.
    ///
    /// Per iteration: advance the learning-rate schedule, fetch one batch,
    /// run `forward_base`, backpropagate, apply one optimizer step, and emit
    /// a running-average progress line. Every `val_step` iterations a
    /// validation pass runs; on strict improvement over the best accuracy
    /// seen so far, the checkpoint is overwritten. After all iterations the
    /// best checkpoint is evaluated against the test loader.
    pub fn train<M: FewShotModel>(&mut self, model: &mut M, config: &TrainConfig) -> Result<f32> {
        self.progress.summary("Start training...")?;

        let params: Vec<Tensor> = model
            .parameters()
            .into_iter()
            .filter(Tensor::requires_grad)
            .collect();
        let mut optimizer = build_optimizer(config);
        let mut scheduler =
            StepDecayLR::new(config.learning_rate, config.lr_step_size, config.lr_gamma);

        let start_iter = match &config.pretrain_ckpt {
            Some(path) => {
                let checkpoint = Checkpoint::load(path)?;
                checkpoint.restore(model)?;
                self.progress
                    .summary(&format!("Successfully loaded checkpoint '{}'", path.display()))?;
                checkpoint.iter + 1
            }
            None => 0,
        };

        model.to_device(config.device)?;

        let ckpt_path = config.checkpoint_path();
        let val_step = (config.val_step as u64).max(1);
        let mut best_acc = 0.0f32;
        let mut iter_loss = RunningAverage::new();
        let mut iter_acc = RunningAverage::new();

        for it in start_iter..start_iter + config.train_iter as u64 {
            scheduler.step();
            scheduler.apply(optimizer.as_mut());

            let batch = self.train_loader.next_batch(config.batch_size)?;
            model.forward_base(&batch)?;
            let loss = model.loss();
            let accuracy = model.accuracy();

            optimizer.zero_grad(&params);
            backward(&loss);
            optimizer.step(&params);

            iter_loss.push(loss.item());
            iter_acc.push(accuracy);
            self.progress
                .train_step((it + 1) as usize, iter_loss.mean(), iter_acc.mean())?;

            // New display window begins with each validation interval
            if it % val_step == 0 {
                iter_loss.reset();
                iter_acc.reset();
            }

            if (it + 1) % val_step == 0 {
                let eval_cfg = EvalConfig {
                    support_size: config.support_size,
                    query_size: config.query_size,
                    query_class: config.query_class,
                    eval_iter: config.val_iter,
                    ckpt: None,
                };
                let acc = self.eval(model, &eval_cfg)?;
                if acc > best_acc {
                    self.progress.summary("Best checkpoint")?;
                    Checkpoint::from_model(model, it).save(&ckpt_path)?;
                    best_acc = acc;
                }
            }
        }

        self.progress.summary("\n####################\n")?;
        self.progress
            .summary(&format!("Finish training {}", config.model_name))?;

        let test_cfg = EvalConfig {
            support_size: config.support_size,
            query_size: config.query_size,
            query_class: config.query_class,
            eval_iter: config.test_iter,
            ckpt: Some(ckpt_path),
        };
        let test_acc = self.eval(model, &test_cfg)?;
        self.progress
            .summary(&format!("Test accuracy: {test_acc}"))?;
        Ok(test_acc)
    }

    /// Run one evaluation pass and return the mean accuracy in [0, 1].
    ///
    /// Without a checkpoint path, evaluates the in-memory parameters against
    /// the validation loader. With one, loads the checkpoint first — a
    /// missing file aborts before any episode is drawn — and evaluates
    /// against the test loader. Episodes are drawn with the training loader
    /// as the background-class reference.
    pub fn eval<M: FewShotModel>(&mut self, model: &mut M, config: &EvalConfig) -> Result<f32> {
        self.progress.newline()?;

        let use_test_loader = match &config.ckpt {
            Some(path) => {
                let checkpoint = Checkpoint::load(path)?;
                checkpoint.restore(model)?;
                true
            }
            None => false,
        };

        let mut iter_right = RunningAverage::new();
        for it in 0..config.eval_iter {
            let episode = if use_test_loader {
                self.test_loader.next_new_relation(
                    &mut self.train_loader,
                    config.support_size,
                    config.query_size,
                    config.query_class,
                )?
            } else {
                self.val_loader.next_new_relation(
                    &mut self.train_loader,
                    config.support_size,
                    config.query_size,
                    config.query_class,
                )?
            };

            model.forward_new(&episode)?;
            iter_right.push(model.accuracy());
            self.progress.eval_step(it + 1, iter_right.mean())?;
        }

        self.progress.newline()?;
        Ok(iter_right.mean())
    }
}

fn build_optimizer(config: &TrainConfig) -> Box<dyn Optimizer> {
    match config.optimizer {
        OptimizerKind::Sgd => Box::new(SGD::plain(config.learning_rate, config.weight_decay)),
        OptimizerKind::AdamW => Box::new(AdamW::default_params(
            config.learning_rate,
            config.weight_decay,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Batch, Episode};
    use crate::error::Error;
    use tempfile::tempdir;

    /// Loader that fabricates fixed-shape batches and episodes forever.
    struct StaticLoader;

    impl DataLoader for StaticLoader {
        fn next_batch(&mut self, batch_size: usize) -> Result<Batch> {
            Ok(Batch::new(
                Tensor::zeros(batch_size, false),
                Tensor::zeros(batch_size, false),
            ))
        }

        fn next_new_relation(
            &mut self,
            _reference: &mut Self,
            support_size: usize,
            query_size: usize,
            _query_class: usize,
        ) -> Result<Episode> {
            Ok(Episode::new(
                Batch::new(
                    Tensor::zeros(support_size, false),
                    Tensor::zeros(support_size, false),
                ),
                Batch::new(
                    Tensor::zeros(query_size, false),
                    Tensor::zeros(query_size, false),
                ),
            ))
        }
    }

    /// Model whose evaluation accuracy follows a script: every
    /// `calls_per_pass` forward_new calls advance to the next value.
    struct ScriptedModel {
        weight: Tensor,
        eval_script: Vec<f32>,
        calls_per_pass: usize,
        forward_new_calls: usize,
        current_accuracy: f32,
    }

    impl ScriptedModel {
        fn new(eval_script: Vec<f32>, calls_per_pass: usize) -> Self {
            Self {
                weight: Tensor::from_vec(vec![1.0, 2.0], true),
                eval_script,
                calls_per_pass,
                forward_new_calls: 0,
                current_accuracy: 0.0,
            }
        }
    }

    impl FewShotModel for ScriptedModel {
        fn forward_base(&mut self, _batch: &Batch) -> Result<()> {
            self.current_accuracy = 0.5;
            Ok(())
        }

        fn forward_new(&mut self, _episode: &Episode) -> Result<()> {
            let pass = self.forward_new_calls / self.calls_per_pass;
            let idx = pass.min(self.eval_script.len() - 1);
            self.current_accuracy = self.eval_script[idx];
            self.forward_new_calls += 1;
            Ok(())
        }

        fn loss(&self) -> Tensor {
            Tensor::from_vec(vec![0.25], false)
        }

        fn accuracy(&self) -> f32 {
            self.current_accuracy
        }

        fn parameters(&self) -> Vec<Tensor> {
            vec![self.weight.clone()]
        }

        fn state_dict(&self) -> Vec<(String, Tensor)> {
            vec![("weight".to_string(), self.weight.clone())]
        }
    }

    fn config_in(dir: &std::path::Path) -> TrainConfig {
        TrainConfig::new("scripted")
            .ckpt_dir(dir)
            .batch_size(4)
            .train_iter(10)
            .val_step(5)
            .val_iter(2)
            .test_iter(2)
            .episode_shape(2, 2, 2)
    }

    #[test]
    fn test_two_validations_with_improvement_keep_latest() {
        let dir = tempdir().unwrap();
        let mut framework = Framework::silent(StaticLoader, StaticLoader, StaticLoader);
        // val passes see 0.6 then 0.8; final test pass reuses the last value
        let mut model = ScriptedModel::new(vec![0.6, 0.8], 2);

        let test_acc = framework.train(&mut model, &config_in(dir.path())).unwrap();

        // Both validations improved on the best so far, so the retained
        // checkpoint is the one written at the second (iteration 9).
        let ckpt = Checkpoint::load(dir.path().join("scripted.ckpt.json")).unwrap();
        assert_eq!(ckpt.iter, 9);
        assert!((test_acc - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_no_checkpoint_on_regression() {
        let dir = tempdir().unwrap();
        let mut framework = Framework::silent(StaticLoader, StaticLoader, StaticLoader);
        // Second validation regresses: only the first writes
        let mut model = ScriptedModel::new(vec![0.6, 0.5], 2);

        framework.train(&mut model, &config_in(dir.path())).unwrap();

        let ckpt = Checkpoint::load(dir.path().join("scripted.ckpt.json")).unwrap();
        assert_eq!(ckpt.iter, 4);
    }

    #[test]
    fn test_resume_starts_one_past_saved_iter() {
        let dir = tempdir().unwrap();
        let pretrain_path = dir.path().join("warm.ckpt.json");

        let warm = ScriptedModel::new(vec![0.1], 2);
        Checkpoint::from_model(&warm, 4).save(&pretrain_path).unwrap();

        let mut framework = Framework::silent(StaticLoader, StaticLoader, StaticLoader);
        let mut model = ScriptedModel::new(vec![0.6, 0.8, 0.9], 2);
        let config = config_in(dir.path())
            .train_iter(5)
            .pretrain_ckpt(&pretrain_path);

        framework.train(&mut model, &config).unwrap();

        // Iterations ran 5..=9, so the single validation fired at it = 9.
        let ckpt = Checkpoint::load(dir.path().join("scripted.ckpt.json")).unwrap();
        assert_eq!(ckpt.iter, 9);
    }

    #[test]
    fn test_resume_from_missing_checkpoint_fails() {
        let dir = tempdir().unwrap();
        let mut framework = Framework::silent(StaticLoader, StaticLoader, StaticLoader);
        let mut model = ScriptedModel::new(vec![0.5], 2);
        let config = config_in(dir.path()).pretrain_ckpt(dir.path().join("absent.ckpt.json"));

        let err = framework.train(&mut model, &config).unwrap_err();
        assert!(matches!(err, Error::CheckpointNotFound(_)));
    }

    #[test]
    fn test_eval_missing_checkpoint_runs_no_iterations() {
        let dir = tempdir().unwrap();
        let mut framework = Framework::silent(StaticLoader, StaticLoader, StaticLoader);
        let mut model = ScriptedModel::new(vec![0.9], 2);

        let config = EvalConfig::default()
            .eval_iter(10)
            .ckpt(dir.path().join("absent.ckpt.json"));
        let err = framework.eval(&mut model, &config).unwrap_err();

        assert!(matches!(err, Error::CheckpointNotFound(_)));
        assert_eq!(model.forward_new_calls, 0);
    }

    #[test]
    fn test_eval_without_checkpoint_uses_in_memory_params() {
        let mut framework = Framework::silent(StaticLoader, StaticLoader, StaticLoader);
        let mut model = ScriptedModel::new(vec![0.7], usize::MAX);

        let config = EvalConfig::default().eval_iter(4).episode_shape(2, 2, 2);
        let acc = framework.eval(&mut model, &config).unwrap();

        assert!((acc - 0.7).abs() < 1e-6);
        assert_eq!(model.forward_new_calls, 4);
    }

    #[test]
    fn test_test_pass_restores_best_parameters() {
        let dir = tempdir().unwrap();
        let mut framework = Framework::silent(StaticLoader, StaticLoader, StaticLoader);
        let mut model = ScriptedModel::new(vec![0.6, 0.8], 2);

        framework.train(&mut model, &config_in(dir.path())).unwrap();

        // The final test pass reloads the checkpointed weights into the model.
        let ckpt = Checkpoint::load(dir.path().join("scripted.ckpt.json")).unwrap();
        assert_eq!(ckpt.state_dict[0].1, model.weight.data().to_vec());
    }
}
