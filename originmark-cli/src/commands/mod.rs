pub mod batch;
pub mod keygen;
pub mod prove;
pub mod show;
pub mod sign;
pub mod verify;
