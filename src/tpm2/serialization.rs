pub mod inout;
