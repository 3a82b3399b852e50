mod book_scenarios;
mod generator_determinism;
mod stream_pipeline;
