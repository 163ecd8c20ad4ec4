// Repository layer for the schedule store

pub mod schedule;

pub use schedule::ScheduleRepository;
