//! Built-in routing elements: [`Distributer`] fans a frame out to per-class
//! branch ports, [`Converger`] joins the branches back in per-channel order.

mod converger;
mod distributer;

pub use converger::Converger;
pub use distributer::Distributer;

crate::register_element!("Distributer", Distributer::default);
crate::register_element!("Converger", Converger::default);
