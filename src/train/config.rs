//! Training and evaluation configuration

use crate::autograd::Device;
use std::path::PathBuf;

/// Which optimization algorithm the framework constructs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OptimizerKind {
    /// Plain stochastic gradient descent. The default.
    #[default]
    Sgd,
    /// AdamW with decoupled weight decay.
    AdamW,
}

/// Everything the training loop needs, as named fields with documented
/// defaults instead of a long parameter list.
#[derive(Clone, Debug)]
pub struct TrainConfig {
    /// Model name; names the checkpoint file.
    pub model_name: String,
    /// Training batch size. Default 500.
    pub batch_size: usize,
    /// Directory checkpoints are written to. Default `./checkpoint`.
    pub ckpt_dir: PathBuf,
    /// Directory for test results. Default `./test_result`.
    pub test_result_dir: PathBuf,
    /// Initial learning rate. Default 1.0.
    pub learning_rate: f32,
    /// Decay the learning rate every this many steps. Defaults to a value
    /// large enough that no decay happens in a normal run.
    pub lr_step_size: usize,
    /// Multiplicative learning-rate decay factor. Default 0.1.
    pub lr_gamma: f32,
    /// Weight decay. Default 1e-5.
    pub weight_decay: f32,
    /// Total training iterations. Default 30_000.
    pub train_iter: usize,
    /// Iterations per validation pass. Default 1_000.
    pub val_iter: usize,
    /// Validate every this many training iterations. Default 2_000.
    pub val_step: usize,
    /// Iterations for the final test pass. Default 3_000.
    pub test_iter: usize,
    /// Device to run on. Default CPU.
    pub device: Device,
    /// Checkpoint to warm-start from. Training resumes one past the
    /// iteration saved in it. Default none.
    pub pretrain_ckpt: Option<PathBuf>,
    /// Optimizer algorithm. Default SGD.
    pub optimizer: OptimizerKind,
    /// Episode shape used during validation and test evaluation.
    pub support_size: usize,
    pub query_size: usize,
    pub query_class: usize,
}

impl TrainConfig {
    /// Config for the given model name with all defaults.
    pub fn new(model_name: impl Into<String>) -> Self {
        Self {
            model_name: model_name.into(),
            batch_size: 500,
            ckpt_dir: PathBuf::from("./checkpoint"),
            test_result_dir: PathBuf::from("./test_result"),
            learning_rate: 1.0,
            lr_step_size: 20_000_000,
            lr_gamma: 0.1,
            weight_decay: 1e-5,
            train_iter: 30_000,
            val_iter: 1_000,
            val_step: 2_000,
            test_iter: 3_000,
            device: Device::Cpu,
            pretrain_ckpt: None,
            optimizer: OptimizerKind::default(),
            support_size: 10,
            query_size: 10,
            query_class: 2,
        }
    }

    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn ckpt_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.ckpt_dir = dir.into();
        self
    }

    pub fn learning_rate(mut self, lr: f32) -> Self {
        self.learning_rate = lr;
        self
    }

    pub fn lr_step_size(mut self, step_size: usize) -> Self {
        self.lr_step_size = step_size;
        self
    }

    pub fn weight_decay(mut self, weight_decay: f32) -> Self {
        self.weight_decay = weight_decay;
        self
    }

    pub fn train_iter(mut self, iters: usize) -> Self {
        self.train_iter = iters;
        self
    }

    pub fn val_iter(mut self, iters: usize) -> Self {
        self.val_iter = iters;
        self
    }

    pub fn val_step(mut self, step: usize) -> Self {
        self.val_step = step.max(1);
        self
    }

    pub fn test_iter(mut self, iters: usize) -> Self {
        self.test_iter = iters;
        self
    }

    pub fn device(mut self, device: Device) -> Self {
        self.device = device;
        self
    }

    pub fn pretrain_ckpt(mut self, path: impl Into<PathBuf>) -> Self {
        self.pretrain_ckpt = Some(path.into());
        self
    }

    pub fn optimizer(mut self, kind: OptimizerKind) -> Self {
        self.optimizer = kind;
        self
    }

    pub fn episode_shape(mut self, support: usize, query: usize, query_class: usize) -> Self {
        self.support_size = support;
        self.query_size = query;
        self.query_class = query_class;
        self
    }

    /// Path of the single retained checkpoint for this model name.
    pub fn checkpoint_path(&self) -> PathBuf {
        self.ckpt_dir.join(format!("{}.ckpt.json", self.model_name))
    }
}

/// Parameters for one evaluation pass.
#[derive(Clone, Debug)]
pub struct EvalConfig {
    /// Support examples per episode. Default 10.
    pub support_size: usize,
    /// Query examples per episode. Default 10.
    pub query_size: usize,
    /// Distinct classes queried per episode. Default 2.
    pub query_class: usize,
    /// Number of evaluation iterations. Default 1_000.
    pub eval_iter: usize,
    /// Checkpoint to evaluate. None evaluates the in-memory parameters
    /// against the validation loader; Some loads the checkpoint (fatally
    /// erroring if missing) and evaluates against the test loader.
    pub ckpt: Option<PathBuf>,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            support_size: 10,
            query_size: 10,
            query_class: 2,
            eval_iter: 1_000,
            ckpt: None,
        }
    }
}

impl EvalConfig {
    pub fn eval_iter(mut self, iters: usize) -> Self {
        self.eval_iter = iters;
        self
    }

    pub fn ckpt(mut self, path: impl Into<PathBuf>) -> Self {
        self.ckpt = Some(path.into());
        self
    }

    pub fn episode_shape(mut self, support: usize, query: usize, query_class: usize) -> Self {
        self.support_size = support;
        self.query_size = query;
        self.query_class = query_class;
        self
    }
}
