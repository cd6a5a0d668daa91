mod loopback;
mod synthetic;
