pub(crate) mod rawg;
