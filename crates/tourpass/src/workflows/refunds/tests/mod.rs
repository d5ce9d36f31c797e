mod common;

mod review;
