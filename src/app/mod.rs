// Application layer: concrete action models behind the ActionModel port.

pub mod models;
