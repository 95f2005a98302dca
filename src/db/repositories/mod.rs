mod groups;
mod scores;
mod tasks;
