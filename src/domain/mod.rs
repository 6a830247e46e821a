// Domain layer: game state, actions, events and the ports the engine talks through.

pub mod action;
pub mod event;
pub mod model;
pub mod ports;
