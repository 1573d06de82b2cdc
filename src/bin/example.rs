use dynamic_connectivity::{DynamicConnectivity, MonoidOperator};

const W: usize = 3;
const H: usize = 3;

/// Paint held by a well, in units of each pigment, and how much it can hold.
#[derive(Debug, Clone, Default)]
struct Well {
    cyan: u32,
    magenta: u32,
    yellow: u32,
    capacity: u32,
}

impl Well {
    fn volume(&self) -> u32 {
        self.cyan + self.magenta + self.yellow
    }
}

impl std::fmt::Display for Well {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let v = self.volume().max(1) as f64;
        write!(
            f,
            "({:.2}, {:.2}, {:.2}) {}/{}",
            self.cyan as f64 / v,
            self.magenta as f64 / v,
            self.yellow as f64 / v,
            self.volume(),
            self.capacity
        )
    }
}

#[derive(Debug)]
struct Mix;

impl MonoidOperator for Mix {
    type Value = Well;
    fn identity() -> Well {
        Well::default()
    }
    fn operate(a: &Well, b: &Well) -> Well {
        Well {
            cyan: a.cyan + b.cyan,
            magenta: a.magenta + b.magenta,
            yellow: a.yellow + b.yellow,
            capacity: a.capacity + b.capacity,
        }
    }
}

type Grid = DynamicConnectivity<Mix>;

fn id(r: usize, c: usize) -> usize {
    r * W + c
}

fn open(g: &mut Grid, a: (usize, usize), b: (usize, usize)) {
    let merged = g.link(id(a.0, a.1), id(b.0, b.1));
    println!(
        "Opening divider between {:?} and {:?}{}",
        a,
        b,
        if merged { "" } else { " (already mixed)" }
    );
}

fn close(g: &mut Grid, a: (usize, usize), b: (usize, usize)) {
    let split = g.cut(id(a.0, a.1), id(b.0, b.1));
    println!(
        "Closing divider between {:?} and {:?}{}",
        a,
        b,
        if split { "" } else { " (still mixed)" }
    );
}

fn show(g: &mut Grid, r: usize, c: usize) {
    let v = id(r, c);
    let mut cells: Vec<_> = g
        .get_vertices(v)
        .into_iter()
        .map(|u| (u / W, u % W))
        .collect();
    cells.sort();
    println!(
        "Well {:?} spans {} cells {:?}, paint {}",
        (r, c),
        g.component_size(v),
        cells,
        g.get_sum(v)
    );
}

fn main() -> Result<(), dynamic_connectivity::Error> {
    let mut g = Grid::new(W * H);
    for r in 0..H {
        for c in 0..W {
            g.set_value(
                id(r, c),
                Well {
                    capacity: 4,
                    ..Well::default()
                },
            )?;
        }
    }
    println!("Created a {H}x{W} grid of empty wells");
    g.update_value(id(0, 0), Well { cyan: 2, ..Well::default() })?;
    g.update_value(id(0, 1), Well { yellow: 2, ..Well::default() })?;
    g.update_value(id(2, 2), Well { magenta: 3, ..Well::default() })?;
    show(&mut g, 0, 0);
    open(&mut g, (0, 0), (0, 1));
    show(&mut g, 0, 1);
    open(&mut g, (0, 1), (1, 1));
    open(&mut g, (1, 1), (1, 0));
    open(&mut g, (1, 0), (0, 0));
    show(&mut g, 1, 0);
    close(&mut g, (0, 0), (0, 1));
    show(&mut g, 0, 0);
    close(&mut g, (1, 1), (1, 0));
    show(&mut g, 0, 0);
    show(&mut g, 1, 1);
    open(&mut g, (1, 1), (2, 1));
    open(&mut g, (2, 1), (2, 2));
    show(&mut g, 0, 1);
    Ok(())
}
