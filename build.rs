fn main() {
    // Only the ESP-IDF firmware build needs the toolchain environment;
    // host builds (tests, simulation) skip it.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
