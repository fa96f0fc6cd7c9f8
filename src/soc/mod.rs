pub mod backplane;
pub mod bus;
pub mod device;
pub mod erom;
pub mod host;
pub mod topology;
