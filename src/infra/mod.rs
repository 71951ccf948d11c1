pub mod gbfs;
