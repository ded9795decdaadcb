//! Trip aggregation: filtering, diagrams, monthly summaries and fuel costs.
//!
//! Every function here is pure over its inputs. Callers load the trip table
//! once and run as many selections against it as they like.

pub mod aggregate;
pub mod compare;
pub mod filter;
pub mod fuel;
pub mod geofence;
pub mod graph;
pub mod utility;
