//! Pokédex chat core: message understanding, name resolution, team
//! synthesis, and the actors that turn all of it into a chat reply.

pub mod actors;
pub mod brain;
pub mod config;
pub mod error;
pub mod models;
pub mod pokeapi;
pub mod telemetry;

#[cfg(test)]
mod tests;
