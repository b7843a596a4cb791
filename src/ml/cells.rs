// ============================================================
// Layer 5 — Recurrent Cells
// ============================================================
// Hand-built LSTM and GRU cells plus the homogeneous stack the
// model runs them in. Both cell types expose the same contract:
//
//   step(input, state) → (output, new state)
//
// so the stack (and the generator, which threads hidden state
// across sampling steps) never cares which unit type it holds.
//
// Gate projections are burn Linear modules: the input path
// carries the bias, the recurrent path does not — one bias per
// gate is enough.
//
// Reference: Hochreiter & Schmidhuber (1997) LSTM
//            Cho et al. (2014) GRU

use burn::{
    nn::{Linear, LinearConfig},
    prelude::*,
    tensor::activation::sigmoid,
};
use serde::{Deserialize, Serialize};

/// Which recurrent unit the stack is built from. Matches the
/// `unit_type` field of the model configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitType {
    Lstm,
    Gru,
}

// ─── LstmCell ─────────────────────────────────────────────────────────────────
/// One LSTM layer processing a single timestep. The four gates
/// are computed in one fused [batch, 4·hidden] projection and
/// sliced apart: input, forget, candidate, output.
#[derive(Module, Debug)]
pub struct LstmCell<B: Backend> {
    input_proj:  Linear<B>,
    hidden_proj: Linear<B>,
    d_hidden: usize,
}

impl<B: Backend> LstmCell<B> {
    pub fn new(d_input: usize, d_hidden: usize, device: &B::Device) -> Self {
        Self {
            input_proj: LinearConfig::new(d_input, 4 * d_hidden).init(device),
            hidden_proj: LinearConfig::new(d_hidden, 4 * d_hidden)
                .with_bias(false)
                .init(device),
            d_hidden,
        }
    }

    /// One timestep: (input [batch, d_input], hidden, cell) →
    /// (output, new hidden, new cell). The output is the new
    /// hidden state.
    pub fn step(
        &self,
        input: Tensor<B, 2>,
        hidden: Tensor<B, 2>,
        cell: Tensor<B, 2>,
    ) -> (Tensor<B, 2>, Tensor<B, 2>, Tensor<B, 2>) {
        let h = self.d_hidden;
        let [batch, _] = hidden.dims();

        let gates = self.input_proj.forward(input) + self.hidden_proj.forward(hidden);

        let input_gate  = sigmoid(gates.clone().slice([0..batch, 0..h]));
        let forget_gate = sigmoid(gates.clone().slice([0..batch, h..2 * h]));
        let candidate   = gates.clone().slice([0..batch, 2 * h..3 * h]).tanh();
        let output_gate = sigmoid(gates.slice([0..batch, 3 * h..4 * h]));

        let cell = forget_gate * cell + input_gate * candidate;
        let hidden = output_gate * cell.clone().tanh();
        (hidden.clone(), hidden, cell)
    }
}

// ─── GruCell ──────────────────────────────────────────────────────────────────
/// One GRU layer processing a single timestep. Input and
/// recurrent projections stay separate because the reset gate
/// scales only the recurrent contribution of the candidate.
#[derive(Module, Debug)]
pub struct GruCell<B: Backend> {
    input_proj:  Linear<B>,
    hidden_proj: Linear<B>,
    d_hidden: usize,
}

impl<B: Backend> GruCell<B> {
    pub fn new(d_input: usize, d_hidden: usize, device: &B::Device) -> Self {
        Self {
            input_proj: LinearConfig::new(d_input, 3 * d_hidden).init(device),
            hidden_proj: LinearConfig::new(d_hidden, 3 * d_hidden)
                .with_bias(false)
                .init(device),
            d_hidden,
        }
    }

    /// One timestep: (input [batch, d_input], hidden) →
    /// (output, new hidden). The output is the new hidden state.
    pub fn step(&self, input: Tensor<B, 2>, hidden: Tensor<B, 2>) -> (Tensor<B, 2>, Tensor<B, 2>) {
        let h = self.d_hidden;
        let [batch, _] = hidden.dims();

        let xi = self.input_proj.forward(input);
        let hh = self.hidden_proj.forward(hidden.clone());

        let reset = sigmoid(
            xi.clone().slice([0..batch, 0..h]) + hh.clone().slice([0..batch, 0..h]),
        );
        let update = sigmoid(
            xi.clone().slice([0..batch, h..2 * h]) + hh.clone().slice([0..batch, h..2 * h]),
        );
        let candidate = (xi.slice([0..batch, 2 * h..3 * h])
            + reset * hh.slice([0..batch, 2 * h..3 * h]))
        .tanh();

        let keep_old = update.clone();
        let take_new = update.neg().add_scalar(1.0);
        let hidden = take_new * candidate + keep_old * hidden;
        (hidden.clone(), hidden)
    }
}

// ─── StackState ───────────────────────────────────────────────────────────────
/// Per-layer recurrent state for one forward position. LSTM
/// layers carry (hidden, cell) pairs, GRU layers a hidden state.
#[derive(Debug, Clone)]
pub enum StackState<B: Backend> {
    Lstm(Vec<(Tensor<B, 2>, Tensor<B, 2>)>),
    Gru(Vec<Tensor<B, 2>>),
}

impl<B: Backend> StackState<B> {
    /// Elementwise blend: where `keep_new` ([batch, 1]) is 1 the
    /// new state is taken, where 0 the old state is held. Used to
    /// freeze state across padded timesteps.
    fn blend(new: Self, old: Self, keep_new: &Tensor<B, 2>) -> Self {
        match (new, old) {
            (StackState::Lstm(new_layers), StackState::Lstm(old_layers)) => StackState::Lstm(
                new_layers
                    .into_iter()
                    .zip(old_layers)
                    .map(|((nh, nc), (oh, oc))| {
                        (mix(nh, oh, keep_new), mix(nc, oc, keep_new))
                    })
                    .collect(),
            ),
            (StackState::Gru(new_layers), StackState::Gru(old_layers)) => StackState::Gru(
                new_layers
                    .into_iter()
                    .zip(old_layers)
                    .map(|(nh, oh)| mix(nh, oh, keep_new))
                    .collect(),
            ),
            // states built by init_state always agree on the kind
            (new, _) => new,
        }
    }
}

fn mix<B: Backend>(new: Tensor<B, 2>, old: Tensor<B, 2>, keep_new: &Tensor<B, 2>) -> Tensor<B, 2> {
    let h = new.dims()[1];
    let keep = keep_new.clone().repeat_dim(1, h);
    let hold = keep.clone().neg().add_scalar(1.0);
    new * keep + old * hold
}

// ─── RecurrentStack ───────────────────────────────────────────────────────────
/// A stack of `num_layers` recurrent cells, all the same unit
/// type, run unidirectionally. Exactly one of the two layer
/// vectors is populated.
#[derive(Module, Debug)]
pub struct RecurrentStack<B: Backend> {
    lstm: Vec<LstmCell<B>>,
    gru:  Vec<GruCell<B>>,
    d_hidden: usize,
}

impl<B: Backend> RecurrentStack<B> {
    pub fn new(
        unit_type: UnitType,
        num_units: usize,
        num_layers: usize,
        d_input: usize,
        device: &B::Device,
    ) -> Self {
        // layer 0 consumes embeddings, deeper layers consume the
        // previous layer's hidden states
        let layer_input = |i: usize| if i == 0 { d_input } else { num_units };
        match unit_type {
            UnitType::Lstm => Self {
                lstm: (0..num_layers)
                    .map(|i| LstmCell::new(layer_input(i), num_units, device))
                    .collect(),
                gru: Vec::new(),
                d_hidden: num_units,
            },
            UnitType::Gru => Self {
                lstm: Vec::new(),
                gru: (0..num_layers)
                    .map(|i| GruCell::new(layer_input(i), num_units, device))
                    .collect(),
                d_hidden: num_units,
            },
        }
    }

    pub fn unit_type(&self) -> UnitType {
        if self.lstm.is_empty() { UnitType::Gru } else { UnitType::Lstm }
    }

    pub fn num_layers(&self) -> usize {
        self.lstm.len().max(self.gru.len())
    }

    pub fn d_hidden(&self) -> usize {
        self.d_hidden
    }

    /// Zero state for every layer.
    pub fn init_state(&self, batch_size: usize, device: &B::Device) -> StackState<B> {
        let zeros = || Tensor::<B, 2>::zeros([batch_size, self.d_hidden], device);
        match self.unit_type() {
            UnitType::Lstm => {
                StackState::Lstm(self.lstm.iter().map(|_| (zeros(), zeros())).collect())
            }
            UnitType::Gru => StackState::Gru(self.gru.iter().map(|_| zeros()).collect()),
        }
    }

    /// One timestep through every layer:
    /// (input [batch, d_input], state) → (output [batch, d_hidden], new state).
    pub fn step(&self, input: Tensor<B, 2>, state: StackState<B>) -> (Tensor<B, 2>, StackState<B>) {
        match state {
            StackState::Lstm(layers) => {
                let mut next = Vec::with_capacity(layers.len());
                let mut x = input;
                for (cell, (h, c)) in self.lstm.iter().zip(layers) {
                    let (out, h, c) = cell.step(x, h, c);
                    next.push((h, c));
                    x = out;
                }
                (x, StackState::Lstm(next))
            }
            StackState::Gru(layers) => {
                let mut next = Vec::with_capacity(layers.len());
                let mut x = input;
                for (cell, h) in self.gru.iter().zip(layers) {
                    let (out, h) = cell.step(x, h);
                    next.push(h);
                    x = out;
                }
                (x, StackState::Gru(next))
            }
        }
    }

    /// Run a whole embedded sequence [batch, timesteps, d_input]
    /// with a [batch, timesteps] float mask (1 = real token).
    /// Masked positions emit zero output and hold their previous
    /// state, so padding contributes nothing downstream.
    pub fn forward(&self, embedded: Tensor<B, 3>, mask: Tensor<B, 2>) -> Tensor<B, 3> {
        let [batch, timesteps, d_input] = embedded.dims();
        let mut state = self.init_state(batch, &embedded.device());
        let mut outputs = Vec::with_capacity(timesteps);

        for t in 0..timesteps {
            let x = embedded
                .clone()
                .slice([0..batch, t..t + 1, 0..d_input])
                .reshape([batch, d_input]);
            let m = mask.clone().slice([0..batch, t..t + 1]);

            let (out, next) = self.step(x, state.clone());
            let out = out * m.clone().repeat_dim(1, self.d_hidden);
            state = StackState::blend(next, state, &m);

            outputs.push(out.reshape([batch, 1, self.d_hidden]));
        }

        Tensor::cat(outputs, 1)
    }
}
