use bytemuck::cast_slice;
use cl_sample::{ClError, OpenCl, SampleConfig, Session, load_kernel_source, square_reference, verify};

fn main() -> Result<(), ClError> {
    env_logger::init();

    /* ---------- 1. Gerät, Kontext, Queue, zwei Buffer ------------ */
    let rt  = OpenCl;
    let cfg = SampleConfig { elements: 1 << 16, ..SampleConfig::default() };
    let mut session = Session::open(&rt, &cfg)?;

    /* ---------- 2. Kernel einlesen & bauen ----------------------- */
    let src = load_kernel_source(&cfg.kernel_path)?;
    session.load_kernel(&src, &cfg.kernel_name, "")?;

    /* ---------- 3. Hostdaten, Dispatch, Read-back ---------------- */
    let h_in      = (0..cfg.elements).map(|i| i as f32 * 0.5).collect::<Vec<_>>();
    let mut h_out = vec![0.0_f32; cfg.elements];
    session.dispatch(&h_in)?;
    session.read_back(&mut h_out)?;                 // blockierend

    /* ---------- 4. Verifizieren & Ausgabe ------------------------ */
    verify(&square_reference(&h_in), &h_out)?;
    println!("square OK, {} bytes read back, last element = {}",
             cast_slice::<f32, u8>(&h_out).len(), h_out[cfg.elements - 1]);

    // Drop von session gibt kernel, program, buffers, queue, context frei
    Ok(())
}
