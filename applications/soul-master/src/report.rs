/// Console rendering of processing reports
use crate::error::Result;
use crate::pipeline::FileReport;
use soul_loudness::LoudnessStats;
use std::fmt;

const RULE: &str = "============================================================";

impl fmt::Display for FileReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = &self.report;
        let params = &report.parameters;

        writeln!(f, "{RULE}")?;
        writeln!(f, "DYNAMIC RANGE COMPRESSION")?;
        writeln!(f, "{RULE}")?;
        writeln!(f, "Input:        {}", self.input.display())?;
        writeln!(
            f,
            "Format:       {} Hz, {} ch, {:.2} s",
            report.sample_rate, report.channels, report.duration_secs
        )?;

        writeln!(f, "\nCompressor Settings:")?;
        for (name, unit, param) in [
            ("Threshold", "dB", params.threshold_db),
            ("Ratio", ":1", params.ratio),
            ("Attack", "ms", params.attack_ms),
            ("Release", "ms", params.release_ms),
            ("Knee", "dB", params.knee_db),
        ] {
            writeln!(
                f,
                "  {:<10} {:>8.2} {:<3} ({})",
                name,
                param.value,
                unit,
                param.source.as_str()
            )?;
        }

        writeln!(f, "\nOriginal Audio:")?;
        write_stats(f, &report.original, report.original_lra_lu)?;

        let c = &report.compression;
        writeln!(f, "\nCompression Results:")?;
        writeln!(f, "  Original Dynamic Range:   {:.2} dB", c.original_dynamic_range_db)?;
        writeln!(f, "  Compressed Dynamic Range: {:.2} dB", c.compressed_dynamic_range_db)?;
        writeln!(f, "  Reduction:                {:.2} dB", c.dynamic_range_reduction_db())?;
        writeln!(f, "  RMS Gain Change:          {:+.2} dB", c.gain_reduction_db)?;

        match &report.normalization {
            Some(n) => {
                writeln!(f, "\nLUFS Normalization:")?;
                writeln!(f, "  Target LUFS:  {:.2} LUFS", n.target_lufs)?;
                writeln!(f, "  Current LUFS: {:.2} LUFS", n.current_lufs)?;
                writeln!(f, "  Makeup Gain:  {:+.2} dB", n.applied_gain_db)?;
                if n.peak_limited {
                    writeln!(
                        f,
                        "  Peak limiting applied ({:.2} -> 1.0), requested {:+.2} dB",
                        n.peak_before_limit, n.requested_gain_db
                    )?;
                }
            }
            None => writeln!(f, "\nSkipping LUFS normalization (--no-normalize)")?,
        }

        writeln!(f, "\nFinal Audio:")?;
        write_stats(f, &report.final_stats, report.final_lra_lu)?;

        writeln!(f, "\n{RULE}")?;
        writeln!(f, "Output: {}", self.output.display())?;
        writeln!(
            f,
            "LUFS:   {:.2} -> {:.2} LUFS",
            report.original.integrated_lufs, report.final_stats.integrated_lufs
        )?;
        writeln!(
            f,
            "LRA:    {:.2} -> {:.2} LU",
            report.original_lra_lu, report.final_lra_lu
        )
    }
}

fn write_stats(f: &mut fmt::Formatter<'_>, stats: &LoudnessStats, lra: f64) -> fmt::Result {
    writeln!(f, "  Integrated LUFS: {:.2} LUFS", stats.integrated_lufs)?;
    writeln!(f, "  Peak:            {:.2} dB", stats.peak_db)?;
    writeln!(f, "  RMS:             {:.2} dB", stats.rms_db)?;
    writeln!(f, "  Crest Factor:    {:.2} dB", stats.crest_factor_db)?;
    writeln!(f, "  Loudness Range:  {:.2} LU", lra)
}

/// Human-readable summary
pub fn render_text(file: &FileReport) -> String {
    file.to_string()
}

/// Pretty-printed JSON
pub fn render_json(file: &FileReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(file)?)
}
