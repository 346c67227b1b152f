mod burst_completion;
mod config_load;
mod heading_coupling;
mod jam_alternation;
mod lock_exclusivity;
mod power_limit;
mod scheduler;
