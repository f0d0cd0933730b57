/// Geographic position in degrees.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LonLat {
    pub lon: f64,
    pub lat: f64,
}

impl LonLat {
    pub const fn new(lon: f64, lat: f64) -> Self {
        LonLat { lon, lat }
    }
}

/// Axis-aligned lon/lat box.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GeoBounds {
    pub min: LonLat,
    pub max: LonLat,
}

impl GeoBounds {
    /// Usable extent of a web-mercator world map.
    pub const WORLD: GeoBounds =
        GeoBounds::new(LonLat::new(-180.0, -85.0), LonLat::new(180.0, 85.0));

    pub const fn new(min: LonLat, max: LonLat) -> Self {
        GeoBounds { min, max }
    }

    pub fn contains(&self, p: LonLat) -> bool {
        p.lon >= self.min.lon
            && p.lon <= self.max.lon
            && p.lat >= self.min.lat
            && p.lat <= self.max.lat
    }

    pub fn clamp_lat(&self, lat: f64) -> f64 {
        lat.clamp(self.min.lat, self.max.lat)
    }

    /// Wraps longitude into `[min.lon, max.lon)`; the map repeats horizontally.
    pub fn wrap_lon(&self, lon: f64) -> f64 {
        let width = self.max.lon - self.min.lon;
        if width <= 0.0 || !lon.is_finite() || (lon >= self.min.lon && lon < self.max.lon) {
            return lon;
        }
        (lon - self.min.lon).rem_euclid(width) + self.min.lon
    }

    /// Latitude clamped, longitude wrapped.
    pub fn normalize(&self, p: LonLat) -> LonLat {
        LonLat::new(self.wrap_lon(p.lon), self.clamp_lat(p.lat))
    }
}
