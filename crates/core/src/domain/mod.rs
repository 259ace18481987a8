pub mod basket;
pub mod item;
pub mod itemset;
