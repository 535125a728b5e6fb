pub mod count_gates;
