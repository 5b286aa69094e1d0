// Domain layer - clip rows, ranges and naming rules

pub mod model;
pub mod rules;
