// Domain layer - Core types shared by the pipeline

pub mod model;
