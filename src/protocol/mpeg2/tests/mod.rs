mod queue;
mod stream;
mod ts;
