//! One-step Q-learning on a [`QNet`] with an Adam optimizer.

use log::{debug, warn};

use crate::agent::as_input;
use crate::network::{Gradients, QNet};
use crate::replay_buffer::Transition;
use crate::snake::action_index;
use crate::utils::{has_non_finite, max_value};

/// Adam with PyTorch defaults for betas and epsilon.
pub struct Adam {
    lr: f32,
    beta1: f32,
    beta2: f32,
    eps: f32,
    t: i32,
    m: Vec<Vec<f32>>,
    v: Vec<Vec<f32>>,
}

impl Adam {
    pub fn new(lr: f32) -> Self {
        Self { lr, beta1: 0.9, beta2: 0.999, eps: 1e-8, t: 0, m: Vec::new(), v: Vec::new() }
    }

    pub fn steps(&self) -> i32 {
        self.t
    }

    pub fn step(&mut self, net: &mut QNet, grads: &Gradients) {
        let grads = grads.tensors();
        if self.m.is_empty() {
            self.m = grads.iter().map(|g| vec![0.0; g.len()]).collect();
            self.v = self.m.clone();
        }
        self.t += 1;
        let bias1 = 1.0 - self.beta1.powi(self.t);
        let bias2_sqrt = (1.0 - self.beta2.powi(self.t)).sqrt();
        let step_size = self.lr / bias1;

        for (k, params) in net.params_mut().into_iter().enumerate() {
            let (m, v, g) = (&mut self.m[k], &mut self.v[k], grads[k]);
            for i in 0..params.len() {
                m[i] = self.beta1 * m[i] + (1.0 - self.beta1) * g[i];
                v[i] = self.beta2 * v[i] + (1.0 - self.beta2) * g[i] * g[i];
                let denom = v[i].sqrt() / bias2_sqrt + self.eps;
                params[i] -= step_size * m[i] / denom;
            }
        }
    }
}

pub struct QTrainer {
    gamma: f32,
    optimizer: Adam,
    grads: Option<Gradients>,
    last_loss: f32,
}

impl QTrainer {
    pub fn new(lr: f32, gamma: f32) -> Self {
        Self { gamma, optimizer: Adam::new(lr), grads: None, last_loss: 0.0 }
    }

    pub fn gamma(&self) -> f32 {
        self.gamma
    }

    /// Mean squared error of the most recent update.
    pub fn last_loss(&self) -> f32 {
        self.last_loss
    }

    pub fn optimizer_steps(&self) -> i32 {
        self.optimizer.steps()
    }

    /// Current predictions and Bellman targets for every row of `batch`.
    ///
    /// Targets copy the predictions except at the chosen action, which gets
    /// `r` for terminal rows and `r + gamma * max_k Q(s')[k]` otherwise.
    pub fn targets(&self, net: &QNet, batch: &[Transition]) -> (Vec<Vec<f32>>, Vec<Vec<f32>>) {
        let states: Vec<_> = batch.iter().map(|t| as_input(&t.state)).collect();
        let preds = net.forward_batch(&states);

        let next_states: Vec<_> = batch.iter().map(|t| as_input(&t.next_state)).collect();
        let next_q = net.forward_batch(&next_states);

        let mut targets = preds.clone();
        for (i, tr) in batch.iter().enumerate() {
            let mut q_new = tr.reward;
            if !tr.done {
                q_new += self.gamma * max_value(&next_q[i]);
            }
            targets[i][action_index(&tr.action)] = q_new;
        }
        (preds, targets)
    }

    /// Single transition, promoted to a batch of one.
    pub fn train_single(&mut self, net: &mut QNet, tr: &Transition) {
        self.train_step(net, std::slice::from_ref(tr));
    }

    /// One gradient step on the mean squared error between predictions and targets.
    pub fn train_step(&mut self, net: &mut QNet, batch: &[Transition]) {
        if batch.is_empty() {
            return;
        }
        let (preds, targets) = self.targets(net, batch);
        let count = (batch.len() * net.output_size()) as f32;

        let grads = self.grads.get_or_insert_with(|| net.gradients());
        grads.zero_grad();

        let mut loss = 0.0f32;
        for ((tr, p), y) in batch.iter().zip(&preds).zip(&targets) {
            let d_out: Vec<f32> = p.iter().zip(y).map(|(p, y)| 2.0 * (p - y) / count).collect();
            loss += p.iter().zip(y).map(|(p, y)| (p - y) * (p - y)).sum::<f32>();
            net.backward(&as_input(&tr.state), &d_out, grads);
        }
        loss /= count;

        if !loss.is_finite() || grads.tensors().iter().any(|g| has_non_finite(g)) {
            warn!("non-finite loss or gradient ({loss}) on batch of {}, skipping update", batch.len());
            return;
        }

        self.optimizer.step(net, grads);
        self.last_loss = loss;
        debug!("train_step batch={} loss={:.6}", batch.len(), loss);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    /// Network whose output is `bias` for every input.
    fn constant_net(bias: [f32; 3]) -> QNet {
        QNet::from_parts(15, 4, 3, vec![0.0; 60], vec![0.0; 4], vec![0.0; 12], bias.to_vec())
            .unwrap()
    }

    fn transition(action: [u8; 3], reward: f32, done: bool) -> Transition {
        let mut state = [0u8; 15];
        state[4] = 1;
        state[12] = 1;
        let mut next_state = [0u8; 15];
        next_state[0] = 1;
        Transition { state, action, reward, next_state, done }
    }

    #[test]
    fn terminal_target_is_reward() {
        let net = constant_net([1.5, -0.25, 3.0]);
        let trainer = QTrainer::new(0.001, 0.9);
        let (preds, targets) = trainer.targets(&net, &[transition([1, 0, 0], -10.0, true)]);
        assert_eq!(targets[0][0], -10.0);
        assert_eq!(targets[0][1], preds[0][1]);
        assert_eq!(targets[0][2], preds[0][2]);
    }

    #[test]
    fn non_terminal_target_bootstraps_from_best_next_value() {
        let net = constant_net([5.0, 1.0, -2.0]);
        let trainer = QTrainer::new(0.001, 0.9);
        let (preds, targets) = trainer.targets(&net, &[transition([1, 0, 0], 10.0, false)]);
        assert!((targets[0][0] - 14.5).abs() < 1e-5);
        assert_eq!(&targets[0][1..], &preds[0][1..]);
    }

    #[test]
    fn targets_follow_each_row_of_a_batch() {
        let net = QNet::new(15, 32, 3, &mut StdRng::seed_from_u64(3));
        let trainer = QTrainer::new(0.001, 0.9);
        let batch = [
            transition([0, 1, 0], 1.0, false),
            transition([0, 0, 1], -10.0, true),
        ];
        let (preds, targets) = trainer.targets(&net, &batch);
        let next_best = max_value(&net.forward(&as_input(&batch[0].next_state)));
        assert!((targets[0][1] - (1.0 + 0.9 * next_best)).abs() < 1e-5);
        assert_eq!(targets[0][0], preds[0][0]);
        assert_eq!(targets[1][2], -10.0);
        assert_eq!(&targets[1][..2], &preds[1][..2]);
    }

    #[test]
    fn only_chosen_action_receives_gradient() {
        let mut net = QNet::new(15, 32, 3, &mut StdRng::seed_from_u64(9));
        let mut before = net.clone();
        let mut trainer = QTrainer::new(0.001, 0.9);
        trainer.train_single(&mut net, &transition([0, 1, 0], -10.0, true));
        assert_eq!(trainer.optimizer_steps(), 1);

        let old_b2 = before.params_mut()[3].to_vec();
        let old_w2 = before.params_mut()[2].to_vec();
        let new_b2 = net.params_mut()[3].to_vec();
        let new_w2 = net.params_mut()[2].to_vec();
        assert_eq!(new_b2[0], old_b2[0]);
        assert_eq!(new_b2[2], old_b2[2]);
        assert_ne!(new_b2[1], old_b2[1]);
        assert_eq!(&new_w2[..32], &old_w2[..32]);
        assert_eq!(&new_w2[64..], &old_w2[64..]);
    }

    #[test]
    fn repeated_updates_move_prediction_towards_target() {
        let mut net = QNet::new(15, 64, 3, &mut StdRng::seed_from_u64(21));
        let mut trainer = QTrainer::new(0.001, 0.9);
        let tr = transition([1, 0, 0], -10.0, true);
        let x = as_input(&tr.state);
        let start = net.forward(&x)[0];

        trainer.train_single(&mut net, &tr);
        let first_loss = trainer.last_loss();
        for _ in 0..200 {
            trainer.train_single(&mut net, &tr);
        }
        let end = net.forward(&x)[0];
        assert!((end + 10.0).abs() < (start + 10.0).abs());
        assert!(trainer.last_loss() < first_loss);
    }

    #[test]
    fn empty_batch_is_a_no_op() {
        let mut net = constant_net([0.0, 0.0, 0.0]);
        let before = net.clone();
        let mut trainer = QTrainer::new(0.001, 0.9);
        trainer.train_step(&mut net, &[]);
        assert_eq!(net, before);
        assert_eq!(trainer.optimizer_steps(), 0);
    }
}
