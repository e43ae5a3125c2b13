use std::env;
use std::f64;
use std::fmt::Write;
use std::fs;
use std::path::Path;

/// Size of the complex FFT `src/fft.rs` is built for: `2 * FFT_SIZE`.
/// `src/fft.rs` asserts the generated table's length against its own `N`
/// at compile time, so a drift here fails the build loudly rather than
/// silently mis-sizing the table. Keep this in sync with
/// `config::fft::FFT_SIZE` in `src/config.rs`.
const COMPLEX_FFT_N: usize = 512;

fn main() {
    let out_dir = env::var_os("OUT_DIR").unwrap();
    let out_dir = Path::new(&out_dir);

    gen_sin_table(out_dir);

    println!("cargo:rerun-if-changed=build.rs");
}

fn gen_sin_table(out_dir: &Path) {
    let sin_table = {
        let mut sin_table = [0i32; COMPLEX_FFT_N];
        for (i, x) in sin_table.iter_mut().enumerate() {
            let sin_sample = f64::sin(2.0 * f64::consts::PI * i as f64 / COMPLEX_FFT_N as f64);
            let fixed_point = (65536.0_f64 * sin_sample).round() as i32;
            *x = fixed_point;
        }
        sin_table
    };

    let mut out = String::new();
    writeln!(out, "const SIN_TABLE: [i32; {}] = [", COMPLEX_FFT_N).unwrap();
    for x in sin_table {
        writeln!(out, "    {},", x).unwrap();
    }
    writeln!(out, "];").unwrap();

    fs::write(out_dir.join("fft_sin_table.rs"), out).unwrap();
}
